//! Fixed sample dataset used when no browser can be reached.

use super::{SourceError, TabSource};
use crate::data::{parse_snapshot_json, SnapshotOrigin, TabId, TabRecord};
use async_trait::async_trait;
use once_cell::sync::Lazy;

/// Bumped whenever `sample_tabs.json` changes.
pub const SAMPLE_DATASET_VERSION: u32 = 1;

const SAMPLE_JSON: &str = include_str!("sample_tabs.json");

static SAMPLE_TABS: Lazy<Vec<TabRecord>> = Lazy::new(|| {
    parse_snapshot_json(SAMPLE_JSON).expect("embedded sample tabs must be well-formed")
});

/// The sample tabs, in their fixed order.
pub fn sample_tabs() -> &'static [TabRecord] {
    &SAMPLE_TABS
}

/// Read-only source serving [`sample_tabs`].
///
/// There is no browser behind it, so every mutation fails as unavailable and
/// the next listing is unchanged.
#[derive(Debug, Default)]
pub struct SampleSource;

impl SampleSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TabSource for SampleSource {
    fn name(&self) -> &str {
        "sample"
    }

    fn origin(&self) -> SnapshotOrigin {
        SnapshotOrigin::Sample
    }

    async fn list_tabs(&self) -> Result<Vec<TabRecord>, SourceError> {
        Ok(sample_tabs().to_vec())
    }

    async fn close_tabs(&self, ids: &[TabId]) -> Result<(), SourceError> {
        Err(SourceError::Unavailable(format!(
            "sample tabs are read-only (close of {} tab(s) ignored)",
            ids.len()
        )))
    }

    async fn activate_tab(&self, id: TabId) -> Result<(), SourceError> {
        Err(SourceError::Unavailable(format!(
            "sample tabs are read-only (focus of tab {} ignored)",
            id
        )))
    }
}
