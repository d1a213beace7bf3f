//! Tab sources: where snapshots come from and where actions are sent.
//!
//! The engine only needs the three operations of [`TabSource`]. The browser
//! owns the real state; a source may change between any two calls.

pub mod devtools;
pub mod memory;
pub mod sample;
pub mod snapshot_file;

pub use devtools::DevToolsSource;
pub use memory::MemorySource;
pub use sample::SampleSource;
pub use snapshot_file::SnapshotFileSource;

use crate::config::{SourceConfig, SourceKind};
use crate::data::{check_unique_ids, Snapshot, SnapshotOrigin, TabId, TabRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    /// The live source cannot be reached at all.
    #[error("Tab source unavailable: {0}")]
    Unavailable(String),

    /// A record in the snapshot is unusable; the whole snapshot is rejected.
    #[error("Malformed tab record at position {index}: {reason}")]
    Malformed { index: usize, reason: String },

    /// Some ids of a batch were not acted on.
    #[error("Action failed for {} tab(s)", failed.len())]
    PartialFailure { failed: Vec<TabId> },

    #[error("Unknown tab id: {0}")]
    UnknownTab(TabId),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

/// Capability set a tab source provides.
#[async_trait]
pub trait TabSource: Send + Sync {
    /// Short name for logs and the status line.
    fn name(&self) -> &str;

    /// Origin recorded on snapshots this source returns.
    fn origin(&self) -> SnapshotOrigin {
        SnapshotOrigin::Live
    }

    /// Current tabs. The returned order is the canonical snapshot order.
    async fn list_tabs(&self) -> Result<Vec<TabRecord>, SourceError>;

    /// Close every id given. Best effort: some ids may close while others fail.
    async fn close_tabs(&self, ids: &[TabId]) -> Result<(), SourceError>;

    /// Focus a tab in its window.
    async fn activate_tab(&self, id: TabId) -> Result<(), SourceError>;
}

/// Fetch a snapshot, substituting the sample dataset when the source is
/// unreachable.
///
/// Unavailability is never reported to the caller. Any other error (a
/// malformed record, a repeated id, a failing endpoint) is.
pub async fn fetch_snapshot(source: &dyn TabSource) -> Result<Snapshot, SourceError> {
    match source.list_tabs().await {
        Ok(tabs) => {
            check_unique_ids(&tabs)?;
            Ok(Snapshot::new(tabs, source.origin()))
        }
        Err(e) if e.is_unavailable() => {
            tracing::debug!("{} unavailable, using sample tabs: {}", source.name(), e);
            Ok(Snapshot::new(sample::sample_tabs().to_vec(), SnapshotOrigin::Sample))
        }
        Err(e) => Err(e),
    }
}

/// Build the source selected by configuration.
pub fn connect(config: &SourceConfig) -> Result<Arc<dyn TabSource>, SourceError> {
    let source: Arc<dyn TabSource> = match config.kind {
        SourceKind::Devtools => Arc::new(DevToolsSource::new(config)?),
        SourceKind::Sample => Arc::new(SampleSource::new()),
        SourceKind::File => {
            let path = config.snapshot_path.clone().ok_or_else(|| {
                SourceError::Unavailable("no snapshot_path configured for file source".to_string())
            })?;
            Arc::new(SnapshotFileSource::new(path))
        }
    };
    tracing::info!("Using tab source: {}", source.name());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_snapshot_falls_back_when_unreachable() {
        let source = MemorySource::new(vec![TabRecord::new(1, "https://a.com", "A")]);
        source.set_reachable(false);
        let snapshot = fetch_snapshot(&source).await.unwrap();
        assert_eq!(snapshot.origin, SnapshotOrigin::Sample);
        assert_eq!(snapshot.tabs, sample::sample_tabs().to_vec());
    }

    #[tokio::test]
    async fn test_fetch_snapshot_uses_live_tabs() {
        let source = MemorySource::new(vec![TabRecord::new(1, "https://a.com", "A")]);
        let snapshot = fetch_snapshot(&source).await.unwrap();
        assert_eq!(snapshot.origin, SnapshotOrigin::Live);
        assert_eq!(snapshot.tabs.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_snapshot_rejects_repeated_id() {
        let source = MemorySource::new(vec![
            TabRecord::new(4, "https://a.com", "A"),
            TabRecord::new(4, "https://b.com", "B"),
        ]);
        let err = fetch_snapshot(&source).await.unwrap_err();
        assert!(matches!(err, SourceError::Malformed { index: 1, .. }));
    }

    #[test]
    fn test_connect_file_source_requires_path() {
        let config = SourceConfig {
            kind: SourceKind::File,
            snapshot_path: None,
            ..SourceConfig::default()
        };
        assert!(connect(&config).is_err());
    }
}
