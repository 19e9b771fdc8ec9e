//! # Append-only record of completed tasks.
//!
//! [`History`] keeps every [`TaskStatus`] in completion order. The result aggregator is the
//! only writer (`push` is crate-private); everyone else reads snapshots.
//!
//! The mean of recorded durations drives the adaptive drain interval
//! (see [`DrainPolicy`](crate::DrainPolicy)).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::tasks::TaskStatus;

/// Completion-ordered task history, cheap to clone (shared storage).
#[derive(Clone, Default)]
pub struct History {
    inner: Arc<RwLock<Vec<TaskStatus>>>,
}

impl History {
    /// Appends a completed status.
    pub(crate) async fn push(&self, status: TaskStatus) {
        self.inner.write().await.push(status);
    }

    /// Returns a copy of every status recorded so far, in completion order.
    pub async fn snapshot(&self) -> Vec<TaskStatus> {
        self.inner.read().await.clone()
    }

    /// Number of recorded statuses.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// True if nothing has completed yet.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Number of recorded statuses that carry an error.
    pub async fn failures(&self) -> usize {
        self.inner
            .read()
            .await
            .iter()
            .filter(|s| !s.is_ok())
            .count()
    }

    /// Arithmetic mean of recorded durations; `None` while history is empty.
    pub async fn mean_duration(&self) -> Option<Duration> {
        let statuses = self.inner.read().await;
        mean(statuses.iter().map(|s| s.duration))
    }
}

fn mean(durations: impl ExactSizeIterator<Item = Duration>) -> Option<Duration> {
    let n = durations.len();
    if n == 0 {
        return None;
    }
    let total: u128 = durations.map(|d| d.as_nanos()).sum();
    let avg = total / n as u128;
    Some(Duration::from_nanos(avg.min(u128::from(u64::MAX)) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TaskId, executor_label};
    use std::time::SystemTime;

    fn status(seq: u64, duration: Duration) -> TaskStatus {
        TaskStatus {
            id: TaskId::new(seq),
            name: "job".into(),
            error: None,
            output: None,
            executor: executor_label(1),
            worker: 1,
            assigned_at: SystemTime::now(),
            started_at: SystemTime::now(),
            duration,
        }
    }

    #[test]
    fn test_mean_of_nothing_is_undefined() {
        assert_eq!(mean(std::iter::empty::<Duration>()), None);
    }

    #[test]
    fn test_mean_arithmetic() {
        let ds = [
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(600),
        ];
        assert_eq!(mean(ds.into_iter()), Some(Duration::from_millis(300)));
    }

    #[tokio::test]
    async fn test_push_keeps_completion_order() {
        let h = History::default();
        assert!(h.is_empty().await);
        assert_eq!(h.mean_duration().await, None);

        h.push(status(2, Duration::from_millis(10))).await;
        h.push(status(0, Duration::from_millis(30))).await;

        let ids: Vec<u64> = h.snapshot().await.iter().map(|s| s.id.seq()).collect();
        assert_eq!(ids, vec![2, 0]);
        assert_eq!(h.len().await, 2);
        assert_eq!(h.failures().await, 0);
        assert_eq!(h.mean_duration().await, Some(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let h = History::default();
        h.push(status(0, Duration::ZERO)).await;
        let snap = h.snapshot().await;
        h.push(status(1, Duration::ZERO)).await;
        assert_eq!(snap.len(), 1);
        assert_eq!(h.len().await, 2);
    }
}
