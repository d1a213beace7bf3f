use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Which tab source to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Chromium DevTools HTTP endpoint
    #[default]
    Devtools,
    /// Built-in sample tabs
    Sample,
    /// JSON dump of `chrome.tabs.query`
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:9222".to_string()
}

fn default_request_timeout() -> u64 {
    5
}

fn default_connect_timeout() -> u64 {
    2
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            endpoint: default_endpoint(),
            snapshot_path: None,
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Characters of the URL shown in the table
    #[serde(default = "default_url_width")]
    pub url_width: usize,
    #[serde(default = "default_true")]
    pub show_last_accessed: bool,
}

fn default_url_width() -> usize {
    30
}

fn default_true() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            url_width: default_url_width(),
            show_last_accessed: true,
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "tabscope").context("Could not determine home directory")
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Where the interactive panel writes its log file.
pub fn log_path() -> Result<PathBuf> {
    Ok(project_dirs()?.cache_dir().join("tabscope.log"))
}

/// Load configuration.
///
/// An explicitly given path must exist. When no path is given, a missing
/// default config file means built-in defaults.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found at {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let p = default_config_path()?;
            if !p.exists() {
                tracing::debug!("No config at {}, using defaults", p.display());
                return Ok(Config::default());
            }
            p
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    Ok(config)
}

/// Write a default config, asking for the DevTools endpoint.
pub fn init_wizard() -> Result<()> {
    use std::io::{self, Write};

    println!("tabscope configuration");
    println!("======================\n");

    let config_path = default_config_path()?;
    if config_path.exists() {
        print!("Config already exists at {}. Overwrite? [y/N] ", config_path.display());
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    println!("Start your browser with --remote-debugging-port=9222 to expose its tabs.\n");
    print!("DevTools endpoint [{}]: ", default_endpoint());
    io::stdout().flush()?;
    let mut endpoint = String::new();
    io::stdin().read_line(&mut endpoint)?;

    let mut config = Config::default();
    if !endpoint.trim().is_empty() {
        config.source.endpoint = endpoint.trim().to_string();
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config_path, toml::to_string_pretty(&config)?)?;

    println!("\nConfig saved to {}", config_path.display());
    println!("Run `tabscope` to open the panel.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.source.kind, SourceKind::Devtools);
        assert_eq!(config.source.endpoint, "http://127.0.0.1:9222");
        assert_eq!(config.ui.url_width, 30);
        assert!(config.ui.show_last_accessed);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [source]
            kind = "file"
            snapshot_path = "/tmp/tabs.json"

            [ui]
            url_width = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.source.kind, SourceKind::File);
        assert_eq!(config.source.snapshot_path, Some(PathBuf::from("/tmp/tabs.json")));
        assert_eq!(config.source.request_timeout_secs, 5);
        assert_eq!(config.ui.url_width, 50);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[source]\nkind = \"sample\"").unwrap();
        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.source.kind, SourceKind::Sample);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_roundtrip_default() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.source.endpoint, Config::default().source.endpoint);
    }
}
