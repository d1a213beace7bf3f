//! Tab list read from a JSON dump of `chrome.tabs.query`.

use super::{SourceError, TabSource};
use crate::data::{parse_snapshot_json, SnapshotOrigin, TabId, TabRecord};
use async_trait::async_trait;
use std::path::PathBuf;

/// Read-only source over a snapshot file, re-read on every listing.
pub struct SnapshotFileSource {
    path: PathBuf,
    name: String,
}

impl SnapshotFileSource {
    pub fn new(path: PathBuf) -> Self {
        let name = format!("file:{}", path.display());
        Self { path, name }
    }
}

#[async_trait]
impl TabSource for SnapshotFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> SnapshotOrigin {
        SnapshotOrigin::File
    }

    async fn list_tabs(&self) -> Result<Vec<TabRecord>, SourceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::Unavailable(format!(
                    "{} does not exist",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        parse_snapshot_json(&content)
    }

    async fn close_tabs(&self, ids: &[TabId]) -> Result<(), SourceError> {
        Err(SourceError::PartialFailure {
            failed: ids.to_vec(),
        })
    }

    async fn activate_tab(&self, id: TabId) -> Result<(), SourceError> {
        Err(SourceError::PartialFailure { failed: vec![id] })
    }
}
