//! Replay sweep - 永続キューを先頭から順に再実行する
//!
//! # フロー
//! 1. 永続キューを読む（毎ステップ読み直す）
//! 2. 先頭を peek（pop しない）
//! 3. handler を引く
//!    - 未登録: warn して先頭を削除、次へ
//!    - 成功: 先頭を削除、次へ
//!    - 失敗: キューはそのまま、sweep を中断
//!
//! 失敗した entry を飛ばして後ろを先に実行することはしない（順序依存のため）。

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::PersistedQueue;
use crate::domain::{OperationId, OperationType, StoreError};
use crate::typed::DynHandler;

/// Where a sweep stopped because a handler failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HaltedAt {
    pub id: OperationId,
    pub op_type: OperationType,
    pub error: String,
}

/// Result of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries whose handler succeeded (removed).
    pub replayed: usize,

    /// Entries with no registered handler (removed without running).
    pub skipped: usize,

    /// Set when a handler failed; that entry is still at the head.
    pub halted: Option<HaltedAt>,
}

impl SweepReport {
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }
}

/// Run one sweep over `queue`.
///
/// `lookup` resolves the handler for an operation type at the moment the
/// entry reaches the head, so registrations made during a sweep apply.
/// `cancel` is checked between entries only; a running handler is awaited.
pub async fn sweep<L>(
    queue: &PersistedQueue,
    lookup: L,
    cancel: &CancellationToken,
) -> Result<SweepReport, StoreError>
where
    L: Fn(&OperationType) -> Option<Arc<dyn DynHandler>>,
{
    let mut report = SweepReport::default();

    loop {
        if cancel.is_cancelled() {
            tracing::debug!("sweep cancelled");
            break;
        }

        let Some(head) = queue.load().await?.into_iter().next() else {
            break;
        };

        let Some(handler) = lookup(head.op_type()) else {
            tracing::warn!(
                op_id = %head.id(),
                op_type = %head.op_type(),
                "no replay handler registered, dropping queued operation"
            );
            if queue.remove_head_if(&head).await? {
                report.skipped += 1;
            } else {
                tracing::warn!(op_id = %head.id(), "queue head changed during replay, re-reading");
            }
            continue;
        };

        tracing::debug!(op_id = %head.id(), op_type = %head.op_type(), "replaying queued operation");
        match handler.handle_dyn(head.payload().clone()).await {
            Ok(()) => {
                if queue.remove_head_if(&head).await? {
                    report.replayed += 1;
                } else {
                    tracing::warn!(op_id = %head.id(), "queue head changed during replay, re-reading");
                }
            }
            Err(err) => {
                tracing::error!(
                    op_id = %head.id(),
                    op_type = %head.op_type(),
                    kind = ?err.kind(),
                    error = %err,
                    "replay handler failed, halting sweep"
                );
                report.halted = Some(HaltedAt {
                    id: head.id(),
                    op_type: head.op_type().clone(),
                    error: err.to_string(),
                });
                break;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HandlerError, QueuedOperation};
    use crate::impls::InMemoryStore;
    use crate::typed::OperationRegistry;
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use ulid::Ulid;

    fn op(t: &str, payload: Value) -> QueuedOperation {
        QueuedOperation::new(
            OperationId::from_ulid(Ulid::new()),
            OperationType::new(t),
            payload,
            Utc::now(),
        )
    }

    fn never() -> CancellationToken {
        CancellationToken::new()
    }

    async fn queue_with(ops: &[(&str, Value)]) -> PersistedQueue {
        let queue = PersistedQueue::new(Arc::new(InMemoryStore::new()), "offlineOperations");
        for (t, p) in ops {
            queue.append(op(t, p.clone())).await.unwrap();
        }
        queue
    }

    fn recording(
        registry: &mut OperationRegistry,
        op_type: &str,
        seen: &Arc<Mutex<Vec<Value>>>,
        fail: bool,
    ) {
        let seen = Arc::clone(seen);
        registry.register_fn(op_type, move |payload| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().unwrap().push(payload);
                if fail {
                    Err(HandlerError::new("remote rejected"))
                } else {
                    Ok(())
                }
            }
        });
    }

    #[tokio::test]
    async fn replays_in_fifo_order() {
        let queue = queue_with(&[("A", json!(1)), ("A", json!(2)), ("A", json!(3))]).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = OperationRegistry::new();
        recording(&mut registry, "A", &seen, false);

        let report = sweep(&queue, |t| registry.get(t), &never()).await.unwrap();

        assert_eq!(report.replayed, 3);
        assert!(!report.is_halted());
        assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!(2), json!(3)]);
        assert!(queue.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn halts_on_first_failure_and_keeps_the_rest() {
        let queue = queue_with(&[("A", json!(1)), ("B", json!(2)), ("A", json!(3))]).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = OperationRegistry::new();
        recording(&mut registry, "A", &seen, false);
        recording(&mut registry, "B", &seen, true);

        let report = sweep(&queue, |t| registry.get(t), &never()).await.unwrap();

        assert_eq!(report.replayed, 1);
        let halted = report.halted.unwrap();
        assert_eq!(halted.op_type.as_str(), "B");
        assert!(halted.error.contains("remote rejected"));

        // A:3 was never attempted
        assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!(2)]);
        let remaining: Vec<(String, Value)> = queue
            .load()
            .await
            .unwrap()
            .into_iter()
            .map(|o| (o.op_type().to_string(), o.payload().clone()))
            .collect();
        assert_eq!(
            remaining,
            vec![("B".to_string(), json!(2)), ("A".to_string(), json!(3))]
        );
    }

    #[tokio::test]
    async fn skips_entries_without_handler() {
        let queue = queue_with(&[("X", json!(0)), ("A", json!(1))]).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = OperationRegistry::new();
        recording(&mut registry, "A", &seen, false);

        let report = sweep(&queue, |t| registry.get(t), &never()).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.replayed, 1);
        assert_eq!(*seen.lock().unwrap(), vec![json!(1)]);
        assert!(queue.load().await.unwrap().is_empty());
    }

    #[rstest]
    #[case::first(0)]
    #[case::middle(2)]
    #[case::last(4)]
    #[tokio::test]
    async fn failing_position_stays_at_head(#[case] k: usize) {
        let ops: Vec<(&str, Value)> = (0..5)
            .map(|i| (if i == k { "F" } else { "A" }, json!(i)))
            .collect();
        let queue = queue_with(&ops).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = OperationRegistry::new();
        recording(&mut registry, "A", &seen, false);
        recording(&mut registry, "F", &seen, true);

        let report = sweep(&queue, |t| registry.get(t), &never()).await.unwrap();

        assert_eq!(report.replayed, k);
        let remaining = queue.load().await.unwrap();
        assert_eq!(remaining.len(), 5 - k);
        assert_eq!(remaining[0].payload(), &json!(k));
        assert_eq!(remaining[0].op_type().as_str(), "F");
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_next_entry() {
        let queue = queue_with(&[("A", json!(1)), ("A", json!(2))]).await;
        let cancel = CancellationToken::new();
        let mut registry = OperationRegistry::new();
        let c = cancel.clone();
        registry.register_fn("A", move |_| {
            let c = c.clone();
            async move {
                c.cancel();
                Ok(())
            }
        });

        let report = sweep(&queue, |t| registry.get(t), &cancel).await.unwrap();

        assert_eq!(report.replayed, 1);
        assert_eq!(queue.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_queue_is_a_noop() {
        let queue = queue_with(&[]).await;
        let registry = OperationRegistry::new();
        let report = sweep(&queue, |t| registry.get(t), &never()).await.unwrap();
        assert_eq!(report, SweepReport::default());
    }

    #[tokio::test]
    async fn picks_up_entries_appended_mid_sweep() {
        let queue = Arc::new(queue_with(&[("A", json!(1))]).await);
        let mut registry = OperationRegistry::new();
        let q = Arc::clone(&queue);
        registry.register_fn("A", move |payload| {
            let q = Arc::clone(&q);
            async move {
                if payload == json!(1) {
                    q.append(op("A", json!(2))).await.unwrap();
                }
                Ok(())
            }
        });

        let report = sweep(&queue, |t| registry.get(t), &never()).await.unwrap();

        assert_eq!(report.replayed, 2);
        assert!(queue.load().await.unwrap().is_empty());
    }
}
