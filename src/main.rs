use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Mutex;
use tabscope::config::{self, Config, SourceKind};
use tabscope::data::{AggregatedTab, TabId};
use tabscope::panel::{Panel, TabAction};
use tabscope::{sources, tui};

#[derive(Parser, Debug)]
#[command(name = "tabscope")]
#[command(about = "Inspect, search and deduplicate open browser tabs")]
#[command(version)]
struct Args {
    /// Write a default config file
    #[arg(long)]
    init: bool,

    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// DevTools endpoint of a browser started with --remote-debugging-port
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Use the built-in sample tabs
    #[arg(long, global = true, conflicts_with_all = ["endpoint", "snapshot"])]
    sample: bool,

    /// Read tabs from a JSON dump of chrome.tabs.query
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current tabs with their duplicate counts
    List {
        /// Only tabs whose title or URL contains this text
        #[arg(long, short)]
        query: Option<String>,

        /// Only tabs whose URL is open more than once
        #[arg(long)]
        duplicates_only: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Close tabs by id
    Close {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Close every tab sharing the URL of the given tab
    CloseDuplicates {
        id: i64,

        /// Keep the given tab open
        #[arg(long)]
        keep: bool,
    },
    /// Focus a tab in the browser
    Focus { id: i64 },
}

fn init_logging(interactive: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("tabscope=info".parse()?);

    if interactive {
        // The terminal belongs to the panel; log to a file instead
        let path = config::log_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(endpoint) = &args.endpoint {
        config.source.kind = SourceKind::Devtools;
        config.source.endpoint = endpoint.clone();
    }
    if let Some(path) = &args.snapshot {
        config.source.kind = SourceKind::File;
        config.source.snapshot_path = Some(path.clone());
    }
    if args.sample {
        config.source.kind = SourceKind::Sample;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.init {
        return config::init_wizard();
    }

    init_logging(args.command.is_none())?;

    let mut config = config::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let source = sources::connect(&config.source)?;

    let Some(command) = args.command else {
        return tui::run(config, source).await;
    };

    let mut panel = Panel::new(source);
    panel.refresh().await?;

    match command {
        Command::List {
            query,
            duplicates_only,
            json,
        } => {
            if let Some(q) = query {
                panel.set_query(q);
            }
            print_view(&panel, duplicates_only, json)?;
        }
        Command::Close { ids } => {
            let ids: Vec<TabId> = ids.into_iter().map(TabId).collect();
            let action = match ids.as_slice() {
                [id] => TabAction::Close(*id),
                _ => TabAction::CloseGroup(ids),
            };
            panel.perform(action).await?;
            print_view(&panel, false, false)?;
        }
        Command::CloseDuplicates { id, keep } => {
            let agg = panel
                .find(TabId(id))
                .with_context(|| format!("No open tab with id {}", id))?;
            let action = if keep {
                TabAction::close_others(agg)
            } else {
                TabAction::close_group(agg)
            };
            panel.perform(action).await?;
            print_view(&panel, false, false)?;
        }
        Command::Focus { id } => {
            panel.perform(TabAction::Focus(TabId(id))).await?;
            print_view(&panel, false, false)?;
        }
    }

    Ok(())
}

fn print_view(panel: &Panel, duplicates_only: bool, json: bool) -> Result<()> {
    let tabs: Vec<&AggregatedTab> = panel
        .visible()
        .iter()
        .filter(|a| !duplicates_only || a.is_duplicated())
        .collect();
    let summary = panel.summary();
    let origin = panel.snapshot().map(|s| s.origin.label()).unwrap_or("-");

    if json {
        let out = serde_json::json!({
            "origin": origin,
            "summary": summary,
            "tabs": tabs,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{:>6}  {:>3}  {:<32}  TITLE", "ID", "DUP", "URL");
    for agg in &tabs {
        println!(
            "{:>6}  {:>3}  {:<32}  {}",
            agg.id().0,
            agg.group_size(),
            tui::truncate_to_width(&agg.tab.url, 32),
            agg.tab.title
        );
    }
    println!(
        "\nTotal Tabs: {}  duplicated URLs: {}  redundant: {}  ({} tabs)",
        summary.total, summary.duplicated_urls, summary.redundant, origin
    );
    Ok(())
}
