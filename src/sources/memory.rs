//! In-memory tab source for tests and headless development.
//!
//! Closes remove tabs, activation moves the `active` flag, and failures can be
//! scripted per id or for the whole source.

use super::{SourceError, TabSource};
use crate::data::{TabId, TabRecord};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct MemorySource {
    tabs: Mutex<Vec<TabRecord>>,
    refused: Mutex<HashSet<TabId>>,
    reachable: AtomicBool,
    list_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(tabs: Vec<TabRecord>) -> Self {
        Self {
            tabs: Mutex::new(tabs),
            refused: Mutex::new(HashSet::new()),
            reachable: AtomicBool::new(true),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Make every close/activate of `id` fail.
    pub fn refuse(&self, id: TabId) {
        lock(&self.refused).insert(id);
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Replace the tab list, as if the user changed tabs in the browser.
    pub fn replace_tabs(&self, tabs: Vec<TabRecord>) {
        *lock(&self.tabs) = tabs;
    }

    pub fn tabs(&self) -> Vec<TabRecord> {
        lock(&self.tabs).clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), SourceError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SourceError::Unavailable("memory source switched off".to_string()))
        }
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TabSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_tabs(&self) -> Result<Vec<TabRecord>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        Ok(lock(&self.tabs).clone())
    }

    async fn close_tabs(&self, ids: &[TabId]) -> Result<(), SourceError> {
        self.check_reachable()?;
        let refused = lock(&self.refused).clone();
        let mut tabs = lock(&self.tabs);

        let mut failed = Vec::new();
        for id in ids {
            if refused.contains(id) || !tabs.iter().any(|t| t.id == *id) {
                failed.push(*id);
                continue;
            }
            tabs.retain(|t| t.id != *id);
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(SourceError::PartialFailure { failed })
        }
    }

    async fn activate_tab(&self, id: TabId) -> Result<(), SourceError> {
        self.check_reachable()?;
        if lock(&self.refused).contains(&id) {
            return Err(SourceError::PartialFailure { failed: vec![id] });
        }

        let mut tabs = lock(&self.tabs);
        let window = tabs
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.window_id)
            .ok_or(SourceError::UnknownTab(id))?;

        // Only one active tab per window
        for tab in tabs.iter_mut().filter(|t| t.window_id == window) {
            tab.active = tab.id == id;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabs() -> Vec<TabRecord> {
        vec![
            TabRecord::new(1, "https://a.com", "A"),
            TabRecord::new(2, "https://a.com", "A2"),
            TabRecord::new(3, "https://b.com", "B"),
        ]
    }

    #[tokio::test]
    async fn test_close_removes_tabs() {
        let source = MemorySource::new(tabs());
        source.close_tabs(&[TabId(1), TabId(3)]).await.unwrap();
        let left: Vec<_> = source.tabs().iter().map(|t| t.id).collect();
        assert_eq!(left, vec![TabId(2)]);
    }

    #[tokio::test]
    async fn test_refused_id_is_partial_failure() {
        let source = MemorySource::new(tabs());
        source.refuse(TabId(2));
        let err = source.close_tabs(&[TabId(1), TabId(2)]).await.unwrap_err();
        match err {
            SourceError::PartialFailure { failed } => assert_eq!(failed, vec![TabId(2)]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(source.tabs().len(), 2);
    }

    #[tokio::test]
    async fn test_activate_moves_active_flag() {
        let source = MemorySource::new(tabs());
        source.activate_tab(TabId(3)).await.unwrap();
        let active: Vec<_> = source.tabs().iter().filter(|t| t.active).map(|t| t.id).collect();
        assert_eq!(active, vec![TabId(3)]);

        let err = source.activate_tab(TabId(42)).await.unwrap_err();
        assert!(matches!(err, SourceError::UnknownTab(TabId(42))));
    }

    #[tokio::test]
    async fn test_unreachable_source() {
        let source = MemorySource::new(tabs());
        source.set_reachable(false);
        assert!(source.list_tabs().await.unwrap_err().is_unavailable());
        assert_eq!(source.list_calls(), 1);
    }
}
