//! Search filtering over an aggregated view.
//!
//! Plain case-insensitive substring matching on title and URL. Results keep
//! the order of the view; nothing is scored or reordered.

use super::AggregatedTab;

/// Keep the tabs whose title or URL contains `query`.
///
/// A blank query (empty or whitespace only) returns the view unchanged.
pub fn filter(tabs: &[AggregatedTab], query: &str) -> Vec<AggregatedTab> {
    let query = query.trim();
    if query.is_empty() {
        return tabs.to_vec();
    }

    let needle = query.to_lowercase();
    tabs.iter()
        .filter(|agg| matches(agg, &needle))
        .cloned()
        .collect()
}

/// `needle` must already be lowercased.
fn matches(agg: &AggregatedTab, needle: &str) -> bool {
    agg.tab.title.to_lowercase().contains(needle) || agg.tab.url.to_lowercase().contains(needle)
}
