//! # Events emitted by the pool.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Worker events**: worker population changes (spawned, stopped)
//! - **Task events**: intake and execution flow (dispatched, rejected, starting, completed, failed)
//! - **Shutdown events**: drain progress and termination
//! - **Subscriber events**: problems delivering events to subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name and id,
//! worker number and counters.
//!
//! ## Ordering guarantees
//! Each event published on a [`Bus`](crate::Bus) gets a sequence number (`seq`) that increases
//! monotonically per bus. Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{Event, EventKind, TaskId};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("resize")
//!     .with_task_id(TaskId::new(7))
//!     .with_worker(2)
//!     .with_duration(Duration::from_millis(120))
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("resize"));
//! assert_eq!(ev.duration_ms, Some(120));
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::tasks::TaskId;

/// Classification of pool events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Worker events ===
    /// A worker routine was started.
    ///
    /// Sets:
    /// - `worker`: worker number
    /// - `live_workers`: live count after the spawn
    WorkerSpawned,

    /// A worker routine exited (retired or terminated).
    ///
    /// Sets:
    /// - `worker`: worker number
    /// - `live_workers`: live count after the exit
    WorkerStopped,

    /// A scale request could not be satisfied in full.
    ///
    /// Sets:
    /// - `live_workers`: live count
    /// - `reason`: which bound was hit
    ScaleLimited,

    // === Task events ===
    /// A task was accepted and handed to a worker.
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `worker`: worker that took the task
    /// - `outstanding`: outstanding count after acceptance
    TaskDispatched,

    /// A dispatch was refused because the pool is draining or terminated.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `reason`: pool state
    TaskRejected,

    /// A worker started running a task.
    ///
    /// Sets:
    /// - `task`, `task_id`, `worker`
    TaskStarting,

    /// A task finished without error.
    ///
    /// Sets:
    /// - `task`, `task_id`, `worker`
    /// - `duration_ms`: run time
    TaskCompleted,

    /// A task returned an error or panicked.
    ///
    /// Sets:
    /// - `task`, `task_id`, `worker`
    /// - `duration_ms`: run time
    /// - `reason`: error message
    TaskFailed,

    /// The aggregator recorded a status in history.
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `outstanding`: outstanding count after the record
    TaskRecorded,

    // === Shutdown events ===
    /// Shutdown requested; intake stopped.
    ///
    /// Sets:
    /// - `outstanding`: outstanding count at the request
    ShutdownRequested,

    /// One drain poll.
    ///
    /// Sets:
    /// - `attempt`: poll number (1-based)
    /// - `outstanding`: observed outstanding count
    /// - `delay_ms`: wait before the next poll
    DrainPolling,

    /// Drain budget exhausted with work still outstanding.
    ///
    /// Sets:
    /// - `attempt`: polls performed
    /// - `outstanding`: outstanding count
    /// - `reason`: error message
    DrainExceeded,

    /// All workers and the aggregator exited.
    ///
    /// Sets:
    /// - `outstanding`: outstanding count at termination (0 unless the drain budget ran out)
    PoolTerminated,
}

/// Pool event with optional metadata.
///
/// - `seq`: per-bus monotonic sequence for ordering (stamped on publish)
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Monotonically increasing sequence number, unique per bus.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task name (or subscriber name for subscriber events).
    pub task: Option<Arc<str>>,
    /// Id of the task, if applicable.
    pub task_id: Option<TaskId>,
    /// Worker number, if applicable.
    pub worker: Option<usize>,
    /// Live worker count.
    pub live_workers: Option<usize>,
    /// Outstanding task count.
    pub outstanding: Option<usize>,
    /// Drain poll number (starting from 1).
    pub attempt: Option<u32>,
    /// Wait before the next drain poll in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Task run time in milliseconds (compact).
    pub duration_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp.
    ///
    /// `seq` is assigned by [`Bus::publish`](crate::Bus::publish).
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            task: None,
            task_id: None,
            worker: None,
            live_workers: None,
            outstanding: None,
            attempt: None,
            delay_ms: None,
            duration_ms: None,
            reason: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task_id(mut self, id: TaskId) -> Self {
        self.task_id = Some(id);
        self
    }

    /// Attaches a worker number.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Attaches the live worker count.
    #[inline]
    pub fn with_live_workers(mut self, n: usize) -> Self {
        self.live_workers = Some(n);
        self
    }

    /// Attaches the outstanding task count.
    #[inline]
    pub fn with_outstanding(mut self, n: usize) -> Self {
        self.outstanding = Some(n);
        self
    }

    /// Attaches a drain poll number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a poll delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a task run time (stored as milliseconds).
    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        self.duration_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// True for events describing subscriber delivery problems.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_ms_saturates() {
        let ev = Event::new(EventKind::DrainPolling).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn test_subscriber_helpers() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_event());
        assert_eq!(ev.task.as_deref(), Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));

        assert!(!Event::new(EventKind::TaskStarting).is_subscriber_event());
    }
}
