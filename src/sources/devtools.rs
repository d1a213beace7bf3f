//! Live tabs from a Chromium browser started with `--remote-debugging-port`.
//!
//! Uses the DevTools HTTP endpoints only:
//! - `GET /json/list` lists targets; only `page` targets are tabs
//! - `GET /json/close/{targetId}` closes one target
//! - `GET /json/activate/{targetId}` focuses one target
//!
//! Target ids are opaque strings. Each target gets an integer [`TabId`] the
//! first time it is listed and keeps it until it disappears from the list.

use super::{SourceError, TabSource};
use crate::config::SourceConfig;
use crate::data::{TabId, TabRecord};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// One entry of `/json/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevToolsTarget {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(default)]
    pub title: String,
    /// Missing on a page only when the browser sent a broken entry.
    pub url: Option<String>,
}

/// Maps DevTools target ids to integer tab ids.
#[derive(Debug)]
pub struct IdRegistry {
    by_target: HashMap<String, TabId>,
    next: i64,
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdRegistry {
    pub fn new() -> Self {
        Self {
            by_target: HashMap::new(),
            next: 1,
        }
    }

    fn assign(&mut self, target_id: &str) -> TabId {
        if let Some(id) = self.by_target.get(target_id) {
            return *id;
        }
        let id = TabId(self.next);
        self.next += 1;
        self.by_target.insert(target_id.to_string(), id);
        id
    }

    /// Target id for a tab id handed out earlier.
    pub fn target_for(&self, id: TabId) -> Option<&str> {
        self.by_target
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(k, _)| k.as_str())
    }

    /// Forget targets that are no longer listed. Their ids are never reused.
    fn retain(&mut self, live: &HashSet<&str>) {
        self.by_target.retain(|target, _| live.contains(target.as_str()));
    }

    /// Turn a `/json/list` response into tab records, in listing order.
    ///
    /// The endpoint lists pages most recently focused first, so the first page
    /// is reported as the active tab. A page without a URL or a target id
    /// listed twice rejects the whole list, leaving the registry untouched.
    pub fn records_from_targets(
        &mut self,
        targets: &[DevToolsTarget],
    ) -> Result<Vec<TabRecord>, SourceError> {
        let mut pages: Vec<(&DevToolsTarget, &str)> = Vec::new();
        let mut live: HashSet<&str> = HashSet::new();

        for (index, target) in targets.iter().enumerate() {
            if target.target_type != "page" {
                continue;
            }
            let url = target.url.as_deref().ok_or_else(|| SourceError::Malformed {
                index,
                reason: format!("target {} has no url", target.id),
            })?;
            if !live.insert(target.id.as_str()) {
                return Err(SourceError::Malformed {
                    index,
                    reason: format!("target {} listed twice", target.id),
                });
            }
            pages.push((target, url));
        }

        self.retain(&live);

        let records = pages
            .into_iter()
            .enumerate()
            .map(|(i, (target, url))| {
                let id = self.assign(&target.id);
                let mut record = TabRecord::new(id.0, url, &target.title);
                record.active = i == 0;
                record
            })
            .collect();
        Ok(records)
    }
}

pub struct DevToolsSource {
    client: reqwest::Client,
    endpoint: String,
    name: String,
    registry: Mutex<IdRegistry>,
}

impl DevToolsSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(2)
            // The debugging port is bound to loopback; never route it through a proxy
            .no_proxy()
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        let name = format!("devtools:{}", endpoint);

        Ok(Self {
            client,
            endpoint,
            name,
            registry: Mutex::new(IdRegistry::new()),
        })
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, IdRegistry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn target_for(&self, id: TabId) -> Option<String> {
        self.registry().target_for(id).map(str::to_string)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, SourceError> {
        let url = format!("{}{}", self.endpoint, path);
        self.client.get(&url).send().await.map_err(map_request_error)
    }

    /// Run one per-target command; false if the browser did not accept it.
    async fn target_command(&self, command: &str, id: TabId) -> bool {
        let Some(target) = self.target_for(id) else {
            tracing::debug!("No DevTools target for tab {}", id);
            return false;
        };

        match self.get(&format!("/json/{}/{}", command, target)).await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!("DevTools {} of {} returned {}", command, target, resp.status());
                false
            }
            Err(e) => {
                tracing::warn!("DevTools {} of {} failed: {}", command, target, e);
                false
            }
        }
    }
}

fn map_request_error(e: reqwest::Error) -> SourceError {
    if e.is_connect() || e.is_timeout() {
        SourceError::Unavailable(e.to_string())
    } else {
        SourceError::Transport(e.to_string())
    }
}

#[async_trait]
impl TabSource for DevToolsSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tabs(&self) -> Result<Vec<TabRecord>, SourceError> {
        let resp = self.get("/json/list").await?;
        if !resp.status().is_success() {
            return Err(SourceError::Transport(format!(
                "/json/list returned {}",
                resp.status()
            )));
        }

        let targets: Vec<DevToolsTarget> = resp
            .json()
            .await
            .map_err(|e| SourceError::Transport(format!("invalid /json/list body: {}", e)))?;

        let tabs = self.registry().records_from_targets(&targets)?;
        tracing::debug!("Listed {} tabs from {}", tabs.len(), self.endpoint);
        Ok(tabs)
    }

    async fn close_tabs(&self, ids: &[TabId]) -> Result<(), SourceError> {
        let mut failed = Vec::new();
        for &id in ids {
            if !self.target_command("close", id).await {
                failed.push(id);
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(SourceError::PartialFailure { failed })
        }
    }

    async fn activate_tab(&self, id: TabId) -> Result<(), SourceError> {
        if self.target_for(id).is_none() {
            return Err(SourceError::UnknownTab(id));
        }
        if self.target_command("activate", id).await {
            Ok(())
        } else {
            Err(SourceError::PartialFailure { failed: vec![id] })
        }
    }
}
