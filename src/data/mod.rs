//! Tab records and the views derived from them.
//!
//! A [`Snapshot`] is what a tab source returned for one `list_tabs` call.
//! Everything else in this module is recomputed from a snapshot and never
//! carried over to the next one.

pub mod aggregate;
pub mod filter;

pub use aggregate::{aggregate, summarize, ViewSummary};
pub use filter::filter;

use crate::sources::SourceError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Browser-assigned tab identifier, unique within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One open tab as reported by a tab source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    pub id: TabId,
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<i64>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub audible: bool,
}

impl TabRecord {
    /// Minimal record with only the fields the engine looks at.
    pub fn new(id: i64, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: TabId(id),
            url: url.into(),
            title: title.into(),
            last_accessed: None,
            active: false,
            window_id: None,
            pinned: false,
            audible: false,
        }
    }
}

/// A tab decorated with every tab in the same snapshot sharing its URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedTab {
    #[serde(flatten)]
    pub tab: TabRecord,
    /// Snapshot order, includes `tab` itself.
    pub duplicates: Vec<TabRecord>,
}

impl AggregatedTab {
    pub fn id(&self) -> TabId {
        self.tab.id
    }

    pub fn duplicate_ids(&self) -> Vec<TabId> {
        self.duplicates.iter().map(|t| t.id).collect()
    }

    pub fn group_size(&self) -> usize {
        self.duplicates.len()
    }

    pub fn is_duplicated(&self) -> bool {
        self.duplicates.len() > 1
    }
}

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOrigin {
    Live,
    Sample,
    File,
}

impl SnapshotOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Sample => "sample",
            Self::File => "file",
        }
    }
}

/// One point-in-time list of tabs.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tabs: Vec<TabRecord>,
    pub origin: SnapshotOrigin,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(tabs: Vec<TabRecord>, origin: SnapshotOrigin) -> Self {
        Self {
            tabs,
            origin,
            fetched_at: Utc::now(),
        }
    }
}

/// Tab as the browser serializes it (`chrome.tabs.Tab`).
///
/// Every field is optional here so that a record missing its id or URL is
/// reported instead of failing deep inside serde with no position.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTab {
    pub id: Option<i64>,
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_accessed: Option<f64>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub window_id: Option<i64>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub audible: bool,
}

fn millis_to_datetime(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(ms as i64).single()
}

/// Validate a raw browser tab list.
///
/// The whole list is rejected on the first record without an id or URL, or
/// on a repeated id: dropping such a record would silently change duplicate
/// groups.
pub fn parse_snapshot(raw: Vec<RawTab>) -> Result<Vec<TabRecord>, SourceError> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut tabs = Vec::with_capacity(raw.len());

    for (index, r) in raw.into_iter().enumerate() {
        let id = r.id.ok_or_else(|| SourceError::Malformed {
            index,
            reason: "missing id".to_string(),
        })?;
        let url = r.url.ok_or_else(|| SourceError::Malformed {
            index,
            reason: format!("tab {} has no url", id),
        })?;
        if !seen.insert(id) {
            return Err(SourceError::Malformed {
                index,
                reason: format!("duplicate tab id {}", id),
            });
        }

        tabs.push(TabRecord {
            id: TabId(id),
            url,
            title: r.title.unwrap_or_default(),
            last_accessed: r.last_accessed.and_then(millis_to_datetime),
            active: r.active,
            window_id: r.window_id,
            pinned: r.pinned,
            audible: r.audible,
        });
    }

    Ok(tabs)
}

/// Reject a record list in which some id appears twice.
pub fn check_unique_ids(tabs: &[TabRecord]) -> Result<(), SourceError> {
    let mut seen = HashSet::with_capacity(tabs.len());
    for (index, tab) in tabs.iter().enumerate() {
        if !seen.insert(tab.id) {
            return Err(SourceError::Malformed {
                index,
                reason: format!("duplicate tab id {}", tab.id),
            });
        }
    }
    Ok(())
}

/// Parse a JSON array of browser tabs, e.g. a `chrome.tabs.query` dump.
pub fn parse_snapshot_json(json: &str) -> Result<Vec<TabRecord>, SourceError> {
    let raw: Vec<RawTab> = serde_json::from_str(json)?;
    parse_snapshot(raw)
}
