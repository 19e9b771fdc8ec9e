//! # Result aggregator: the single writer of pool history.
//!
//! Workers send a [`TaskStatus`] for every finished task over a bounded queue.
//! The aggregator appends each one to [`History`](crate::History) and only then
//! decrements the outstanding count, so `outstanding == 0` implies every accepted
//! task is visible in history.
//!
//! ## Shutdown
//! ```text
//! token cancelled ─► stop intake (rx.close())
//!                 ─► record statuses already queued
//!                 ─► exit
//! ```
//! The controller cancels the aggregator only after every worker exited, so no
//! status can arrive after the drain.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::state::Shared;
use crate::events::{Event, EventKind};
use crate::tasks::TaskStatus;

pub(crate) struct Aggregator {
    shared: Arc<Shared>,
    rx: mpsc::Receiver<TaskStatus>,
    token: CancellationToken,
}

impl Aggregator {
    pub(crate) fn new(
        shared: Arc<Shared>,
        rx: mpsc::Receiver<TaskStatus>,
        token: CancellationToken,
    ) -> Self {
        Self { shared, rx, token }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                maybe = self.rx.recv() => match maybe {
                    Some(status) => self.record(status).await,
                    None => break,
                },
                _ = self.token.cancelled() => {
                    self.rx.close();
                    while let Some(status) = self.rx.recv().await {
                        self.record(status).await;
                    }
                    break;
                }
            }
        }
        let recorded = self.shared.history.len().await;
        tracing::debug!(recorded, "aggregator stopped");
    }

    async fn record(&self, status: TaskStatus) {
        let ev = Event::new(EventKind::TaskRecorded)
            .with_task(status.name.as_str())
            .with_task_id(status.id)
            .with_worker(status.worker)
            .with_duration(status.duration);

        self.shared.history.push(status).await;
        let left = self.shared.task_settled();
        self.shared.bus.publish(ev.with_outstanding(left));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;
    use crate::tasks::{TaskId, executor_label};
    use std::time::{Duration, SystemTime};

    fn status(seq: u64) -> TaskStatus {
        TaskStatus {
            id: TaskId::new(seq),
            name: "job".into(),
            error: None,
            output: None,
            executor: executor_label(1),
            worker: 1,
            assigned_at: SystemTime::now(),
            started_at: SystemTime::now(),
            duration: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_records_then_settles() {
        let shared = Arc::new(Shared::new(Bus::new(8)));
        let (tx, rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        let handle = tokio::spawn(Aggregator::new(shared.clone(), rx, token.clone()).run());

        shared.task_accepted();
        shared.task_accepted();
        tx.send(status(0)).await.unwrap();
        tx.send(status(1)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(shared.outstanding(), 0);
        let ids: Vec<u64> = shared
            .history
            .snapshot()
            .await
            .iter()
            .map(|s| s.id.seq())
            .collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_cancel_drains_queued_statuses() {
        let shared = Arc::new(Shared::new(Bus::new(8)));
        let (tx, rx) = mpsc::channel(4);
        let token = CancellationToken::new();

        for seq in 0..3 {
            shared.task_accepted();
            tx.send(status(seq)).await.unwrap();
        }
        token.cancel();

        Aggregator::new(shared.clone(), rx, token).run().await;
        assert_eq!(shared.history.len().await, 3);
        assert_eq!(shared.outstanding(), 0);
        assert!(tx.is_closed());
    }
}
