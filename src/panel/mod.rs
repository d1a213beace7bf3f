//! Panel state: the last snapshot, the search query, and the views derived
//! from them.
//!
//! Every mutation goes through [`reconcile`]: forward the action, wait for it,
//! then fetch a fresh snapshot no matter how the action went. The panel never
//! edits its own view to anticipate an action's effect.

use crate::data::{
    aggregate, filter, summarize, AggregatedTab, Snapshot, SnapshotOrigin, TabId, ViewSummary,
};
use crate::sources::{fetch_snapshot, SourceError, TabSource};
use std::sync::Arc;

/// A user-triggered mutation, addressed by tab id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabAction {
    /// Close a single tab
    Close(TabId),
    /// Close every tab of a duplicate group
    CloseGroup(Vec<TabId>),
    /// Close a duplicate group except one tab
    CloseOthers { keep: TabId, group: Vec<TabId> },
    /// Focus a tab
    Focus(TabId),
}

impl TabAction {
    pub fn close_group(agg: &AggregatedTab) -> Self {
        Self::CloseGroup(agg.duplicate_ids())
    }

    pub fn close_others(agg: &AggregatedTab) -> Self {
        Self::CloseOthers {
            keep: agg.id(),
            group: agg.duplicate_ids(),
        }
    }

    /// Ids the source is asked to close, in group order.
    pub fn ids_to_close(&self) -> Vec<TabId> {
        match self {
            Self::Close(id) => vec![*id],
            Self::CloseGroup(ids) => ids.clone(),
            Self::CloseOthers { keep, group } => {
                group.iter().copied().filter(|id| id != keep).collect()
            }
            Self::Focus(_) => Vec::new(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Close(id) => format!("Closing tab {}", id),
            Self::CloseGroup(ids) => format!("Closing {} duplicate tab(s)", ids.len()),
            Self::CloseOthers { group, .. } => {
                format!("Closing {} other duplicate(s)", group.len().saturating_sub(1))
            }
            Self::Focus(id) => format!("Focusing tab {}", id),
        }
    }
}

/// What the panel is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Refresh,
    Action(TabAction),
}

impl Operation {
    pub fn label(&self) -> String {
        match self {
            Self::Refresh => "Refreshing".to_string(),
            Self::Action(action) => action.label(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActionState {
    #[default]
    Idle,
    InFlight(Operation),
}

/// Send an action to the source and wait for it.
pub async fn forward(source: &dyn TabSource, action: &TabAction) -> Result<(), SourceError> {
    match action {
        TabAction::Focus(id) => source.activate_tab(*id).await,
        other => {
            let ids = other.ids_to_close();
            if ids.is_empty() {
                return Ok(());
            }
            source.close_tabs(&ids).await
        }
    }
}

/// Forward `action`, then re-fetch the snapshot unconditionally.
///
/// The action's own result is only logged: whatever it did or failed to do
/// shows up in the fresh snapshot. Errors returned here come from the re-fetch.
pub async fn reconcile(
    source: &dyn TabSource,
    action: &TabAction,
) -> Result<Snapshot, SourceError> {
    match forward(source, action).await {
        Ok(()) => tracing::debug!("{} via {}: done", action.label(), source.name()),
        Err(SourceError::Unavailable(msg)) => {
            tracing::debug!("{} via {}: source unavailable: {}", action.label(), source.name(), msg)
        }
        Err(e) => tracing::warn!("{} via {}: {}", action.label(), source.name(), e),
    }
    fetch_snapshot(source).await
}

/// Run one operation against the source to completion.
pub async fn run_operation(
    source: &dyn TabSource,
    op: &Operation,
) -> Result<Snapshot, SourceError> {
    match op {
        Operation::Refresh => fetch_snapshot(source).await,
        Operation::Action(action) => reconcile(source, action).await,
    }
}

pub struct Panel {
    source: Arc<dyn TabSource>,
    snapshot: Option<Snapshot>,
    query: String,
    aggregated: Vec<AggregatedTab>,
    visible: Vec<AggregatedTab>,
    state: ActionState,
    error: Option<String>,
}

impl Panel {
    pub fn new(source: Arc<dyn TabSource>) -> Self {
        Self {
            source,
            snapshot: None,
            query: String::new(),
            aggregated: Vec::new(),
            visible: Vec::new(),
            state: ActionState::Idle,
            error: None,
        }
    }

    pub fn source(&self) -> Arc<dyn TabSource> {
        Arc::clone(&self.source)
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// All tabs of the snapshot with their duplicate groups.
    pub fn aggregated(&self) -> &[AggregatedTab] {
        &self.aggregated
    }

    /// Tabs matching the current query.
    pub fn visible(&self) -> &[AggregatedTab] {
        &self.visible
    }

    pub fn summary(&self) -> ViewSummary {
        summarize(&self.aggregated)
    }

    pub fn state(&self) -> &ActionState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, ActionState::InFlight(_))
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn find(&self, id: TabId) -> Option<&AggregatedTab> {
        self.aggregated.iter().find(|a| a.id() == id)
    }

    /// Change the query. Only the filtered view is recomputed.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.visible = filter(&self.aggregated, &self.query);
    }

    /// Replace everything derived with views of `snapshot`.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.aggregated = aggregate(&snapshot.tabs);
        self.visible = filter(&self.aggregated, &self.query);
        self.snapshot = Some(snapshot);
        self.error = None;
    }

    /// The operation to run for `op` given what the panel currently shows.
    ///
    /// Ids of the sample tabs do not name real tabs. While the sample is shown
    /// in place of a live source, an action is downgraded to a refresh.
    pub fn resolve(&self, op: Operation) -> Operation {
        let showing_sample = self
            .snapshot
            .as_ref()
            .is_some_and(|s| s.origin == SnapshotOrigin::Sample);
        let live_source = self.source.origin() != SnapshotOrigin::Sample;

        match op {
            Operation::Action(action) if showing_sample && live_source => {
                tracing::warn!(
                    "{} not sent to {}: the shown tabs are sample tabs",
                    action.label(),
                    self.source.name()
                );
                Operation::Refresh
            }
            other => other,
        }
    }

    /// Mark `op` as in flight. False if another operation already is.
    pub fn begin(&mut self, op: Operation) -> bool {
        if self.is_busy() {
            tracing::debug!("Ignoring {:?}: {:?} in flight", op, self.state);
            return false;
        }
        self.state = ActionState::InFlight(op);
        true
    }

    /// Complete the in-flight operation with its re-fetch result.
    ///
    /// A failed fetch keeps the previous views and records the error, which
    /// is also handed back.
    pub fn finish(&mut self, result: Result<Snapshot, SourceError>) -> Result<(), SourceError> {
        self.state = ActionState::Idle;
        match result {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Snapshot rejected: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch a snapshot and re-derive the views.
    pub async fn refresh(&mut self) -> Result<(), SourceError> {
        self.run(Operation::Refresh).await
    }

    /// Apply an action through the source, then re-derive from a fresh snapshot.
    pub async fn perform(&mut self, action: TabAction) -> Result<(), SourceError> {
        self.run(Operation::Action(action)).await
    }

    async fn run(&mut self, op: Operation) -> Result<(), SourceError> {
        let op = self.resolve(op);
        if !self.begin(op.clone()) {
            return Ok(());
        }
        let source = self.source();
        let result = run_operation(source.as_ref(), &op).await;
        self.finish(result)
    }
}
