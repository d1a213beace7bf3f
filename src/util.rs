//! Small helpers shared by the panel front-ends.

use tokio::sync::mpsc;

/// Hand a background result to the panel's event loop.
///
/// The loop drops its receiver when the user quits with an operation still in
/// flight; the late snapshot is then discarded with a debug line naming `what`.
pub async fn send_or_log<T>(tx: &mpsc::Sender<T>, value: T, what: &str) {
    if tx.send(value).await.is_err() {
        tracing::debug!("Panel closed before {} arrived", what);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Snapshot, SnapshotOrigin, TabRecord};

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![TabRecord::new(1, "https://a.com", "A")],
            SnapshotOrigin::Live,
        )
    }

    #[tokio::test]
    async fn test_result_reaches_event_loop() {
        let (tx, mut rx) = mpsc::channel(1);
        send_or_log(&tx, snapshot(), "refresh result").await;
        let got = rx.recv().await.unwrap();
        assert_eq!(got.tabs.len(), 1);
    }

    #[tokio::test]
    async fn test_result_dropped_after_quit() {
        let (tx, rx) = mpsc::channel::<Snapshot>(1);
        drop(rx);
        send_or_log(&tx, snapshot(), "refresh result").await;
        assert!(tx.is_closed());
    }
}
