//! # Completion record of a single task.
//!
//! A [`TaskStatus`] is built by the worker that ran the task and handed to the result
//! aggregator, which appends it to the pool [`History`](crate::History). Once appended it
//! is never modified.

use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::error::TaskError;
use crate::tasks::{TaskId, TaskOutput};

/// Outcome of one task execution.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatus {
    /// Id issued at dispatch.
    pub id: TaskId,
    /// Task name at the time it ran.
    pub name: String,
    /// Error returned (or panic caught) during the run.
    pub error: Option<TaskError>,
    /// Payload returned by a successful run.
    pub output: Option<TaskOutput>,
    /// Label of the worker that ran the task (`"worker-<n>"`).
    pub executor: String,
    /// Number of the worker that ran the task.
    pub worker: usize,
    /// When the dispatcher accepted the task.
    pub assigned_at: SystemTime,
    /// When the worker started running it.
    pub started_at: SystemTime,
    /// Wall-clock time spent inside `Task::run`.
    pub duration: Duration,
}

impl TaskStatus {
    /// True if the run finished without error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Time the task spent between acceptance and start.
    ///
    /// Zero if the wall clock went backwards in between.
    pub fn queued_for(&self) -> Duration {
        self.started_at
            .duration_since(self.assigned_at)
            .unwrap_or_default()
    }

    /// Wall-clock completion time.
    pub fn finished_at(&self) -> SystemTime {
        self.started_at + self.duration
    }
}

/// Executor label for worker `n`.
pub(crate) fn executor_label(worker: usize) -> String {
    format!("worker-{worker}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(assigned_at: SystemTime, started_at: SystemTime) -> TaskStatus {
        TaskStatus {
            id: TaskId::new(0),
            name: "job".into(),
            error: None,
            output: None,
            executor: executor_label(4),
            worker: 4,
            assigned_at,
            started_at,
            duration: Duration::from_millis(25),
        }
    }

    #[test]
    fn test_queued_for_and_finished_at() {
        let assigned = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let s = status(assigned, assigned + Duration::from_millis(15));

        assert_eq!(s.queued_for(), Duration::from_millis(15));
        assert_eq!(s.finished_at(), assigned + Duration::from_millis(40));
    }

    #[test]
    fn test_queued_for_clock_went_backwards() {
        let assigned = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let s = status(assigned, assigned - Duration::from_secs(1));
        assert_eq!(s.queued_for(), Duration::ZERO);
    }

    #[test]
    fn test_executor_label() {
        assert_eq!(executor_label(3), "worker-3");
        assert_eq!(status(SystemTime::now(), SystemTime::now()).executor, "worker-4");
    }
}
