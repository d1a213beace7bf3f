//! Duplicate grouping by exact URL.

use super::{AggregatedTab, TabRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Annotate every tab with the tabs sharing its URL.
///
/// Output has one entry per input tab, in input order. URLs are compared as
/// raw strings, so `https://a.com` and `https://a.com/` are different groups.
pub fn aggregate(tabs: &[TabRecord]) -> Vec<AggregatedTab> {
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::with_capacity(tabs.len());
    for (i, tab) in tabs.iter().enumerate() {
        groups.entry(tab.url.as_str()).or_default().push(i);
    }

    tabs.iter()
        .map(|tab| {
            let duplicates = groups
                .get(tab.url.as_str())
                .map(|indices| indices.iter().map(|&i| tabs[i].clone()).collect())
                .unwrap_or_default();
            AggregatedTab {
                tab: tab.clone(),
                duplicates,
            }
        })
        .collect()
}

/// Counts shown alongside a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewSummary {
    pub total: usize,
    /// URLs open in more than one tab.
    pub duplicated_urls: usize,
    /// Tabs that could be closed while keeping one tab per URL.
    pub redundant: usize,
}

pub fn summarize(view: &[AggregatedTab]) -> ViewSummary {
    let mut distinct = HashSet::new();
    let mut duplicated = HashSet::new();
    for agg in view {
        distinct.insert(agg.tab.url.as_str());
        if agg.is_duplicated() {
            duplicated.insert(agg.tab.url.as_str());
        }
    }

    ViewSummary {
        total: view.len(),
        duplicated_urls: duplicated.len(),
        redundant: view.len() - distinct.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TabId;

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
        assert_eq!(summarize(&[]), ViewSummary::default());
    }

    #[test]
    fn test_unique_urls_are_singletons() {
        let tabs = vec![
            TabRecord::new(1, "https://a.com", "A"),
            TabRecord::new(2, "https://b.com", "B"),
        ];
        let view = aggregate(&tabs);
        assert!(view.iter().all(|a| a.group_size() == 1));
        assert_eq!(view[1].duplicate_ids(), vec![TabId(2)]);
    }

    #[test]
    fn test_no_url_normalization() {
        let tabs = vec![
            TabRecord::new(1, "https://a.com", "A"),
            TabRecord::new(2, "https://a.com/", "A"),
            TabRecord::new(3, "https://a.com?x=1", "A"),
        ];
        let view = aggregate(&tabs);
        assert!(view.iter().all(|a| !a.is_duplicated()));
    }

    #[test]
    fn test_summary_counts() {
        let tabs = vec![
            TabRecord::new(1, "https://a.com", "A"),
            TabRecord::new(2, "https://a.com", "A"),
            TabRecord::new(3, "https://a.com", "A"),
            TabRecord::new(4, "https://b.com", "B"),
            TabRecord::new(5, "https://c.com", "C"),
            TabRecord::new(6, "https://c.com", "C"),
        ];
        let summary = summarize(&aggregate(&tabs));
        assert_eq!(
            summary,
            ViewSummary {
                total: 6,
                duplicated_urls: 2,
                redundant: 3,
            }
        );
    }
}
