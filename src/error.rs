//! Error types used by the pool runtime and by tasks.
//!
//! This module defines two main error enums:
//!
//! - [`PoolError`]: errors raised by the pool itself (construction, intake, shutdown).
//! - [`TaskError`]: errors raised by individual task executions.
//!
//! Task errors never travel back to the dispatching caller: they are recorded on the
//! [`TaskStatus`](crate::TaskStatus) and discovered through the pool history.
//! Both types provide `as_label` for logs/metrics.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::core::PoolState;

/// # Errors produced by the pool runtime.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Configuration cannot produce a working pool.
    #[error("invalid pool configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The pool no longer accepts work (shutdown requested or finished).
    #[error("pool is {state}; request rejected")]
    Rejected {
        /// Lifecycle state observed when the request arrived.
        state: PoolState,
    },

    /// Pool routines are gone; the request could not be handed over.
    #[error("pool routines are gone")]
    Closed,

    /// Drain budget ran out with work still outstanding; workers were terminated anyway.
    #[error("drain budget of {attempts} polls exhausted after {waited:?}; {outstanding} task(s) still outstanding")]
    DrainExceeded {
        /// Number of polls performed.
        attempts: u32,
        /// Outstanding count observed after the last poll.
        outstanding: usize,
        /// Time spent polling.
        waited: Duration,
    },
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::{PoolError, PoolState};
    ///
    /// let err = PoolError::Rejected { state: PoolState::Draining };
    /// assert_eq!(err.as_label(), "pool_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::InvalidConfig { .. } => "pool_invalid_config",
            PoolError::Rejected { .. } => "pool_rejected",
            PoolError::Closed => "pool_closed",
            PoolError::DrainExceeded { .. } => "pool_drain_exceeded",
        }
    }

    /// True if the error means the pool is (or is becoming) unavailable for new work.
    pub fn is_rejection(&self) -> bool {
        matches!(self, PoolError::Rejected { .. } | PoolError::Closed)
    }
}

/// # Errors produced by task execution.
///
/// Recorded on the task's status; never retried by the pool.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task panicked; the worker caught the panic and kept running.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Builds a [`TaskError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        TaskError::Panicked { info }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_rendering() {
        let p: Box<dyn std::any::Any + Send> = Box::new("static boom");
        assert_eq!(
            TaskError::from_panic(p.as_ref()),
            TaskError::Panicked {
                info: "static boom".into()
            }
        );

        let p: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(TaskError::from_panic(p.as_ref()).as_message(), "panic: owned boom");

        let p: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(
            TaskError::from_panic(p.as_ref()).as_message(),
            "panic: unknown panic"
        );
    }

    #[test]
    fn test_task_error_serializes_tagged() {
        let json = serde_json::to_value(TaskError::fail("disk full")).unwrap();
        assert_eq!(json["kind"], "fail");
        assert_eq!(json["error"], "disk full");
    }

    #[test]
    fn test_rejection_classification() {
        assert!(PoolError::Closed.is_rejection());
        assert!(
            PoolError::Rejected {
                state: PoolState::Terminated
            }
            .is_rejection()
        );
        assert!(
            !PoolError::InvalidConfig {
                reason: "x".into()
            }
            .is_rejection()
        );
    }

    #[test]
    fn test_drain_exceeded_message() {
        let err = PoolError::DrainExceeded {
            attempts: 30,
            outstanding: 2,
            waited: Duration::from_secs(3),
        };
        assert_eq!(err.as_label(), "pool_drain_exceeded");
        assert!(err.to_string().contains("2 task(s) still outstanding"));
    }
}
