//! # Task identifiers and the queued-task envelope.
//!
//! [`TaskId`] is issued by the dispatcher from a per-pool monotonically increasing
//! sequence, so ids are unique for the pool's lifetime and compare in dispatch order.
//! [`QueuedTask`] carries a task from the dispatcher to exactly one worker.

use std::fmt;
use std::time::SystemTime;

use serde::{Serialize, Serializer};

use crate::tasks::TaskRef;

/// Identifier of a dispatched task.
///
/// Renders as the decimal dispatch sequence number (`"0"`, `"1"`, ...).
///
/// ```
/// use taskpool::TaskId;
///
/// let id = TaskId::new(41);
/// assert_eq!(id.to_string(), "41");
/// assert!(TaskId::new(3) < TaskId::new(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Creates an id from a dispatch sequence number.
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the dispatch sequence number.
    pub const fn seq(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A task accepted by the dispatcher, waiting to be picked up by a worker.
pub(crate) struct QueuedTask {
    pub(crate) id: TaskId,
    pub(crate) task: TaskRef,
    pub(crate) assigned_at: SystemTime,
}

impl QueuedTask {
    /// Wraps `task`, stamping the assignment time.
    pub(crate) fn new(id: TaskId, task: TaskRef) -> Self {
        Self {
            id,
            task,
            assigned_at: SystemTime::now(),
        }
    }
}
