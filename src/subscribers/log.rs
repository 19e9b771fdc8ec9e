//! # LogWriter: forwards pool events to `tracing`
//!
//! A subscriber that turns every [`Event`] into a leveled, structured `tracing` record.
//! Install any `tracing` subscriber in the application to see the output.
//!
//! | Level   | Events                                                                  |
//! |---------|-------------------------------------------------------------------------|
//! | `debug` | task dispatched/starting/recorded, drain polls                          |
//! | `info`  | worker spawned/stopped, task completed, shutdown requested, terminated  |
//! | `warn`  | task failed, task rejected, scale limited, subscriber problems          |
//! | `error` | drain budget exceeded                                                   |

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref();
        let task_id = e.task_id.map(|id| id.seq());
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::WorkerSpawned => {
                info!(worker = e.worker, live = e.live_workers, "worker spawned");
            }
            EventKind::WorkerStopped => {
                info!(worker = e.worker, live = e.live_workers, "worker stopped");
            }
            EventKind::ScaleLimited => {
                warn!(live = e.live_workers, reason, "scale request limited");
            }
            EventKind::TaskDispatched => {
                debug!(
                    task,
                    task_id,
                    worker = e.worker,
                    outstanding = e.outstanding,
                    "task dispatched"
                );
            }
            EventKind::TaskRejected => {
                warn!(task, reason, "task rejected");
            }
            EventKind::TaskStarting => {
                debug!(task, task_id, worker = e.worker, "task starting");
            }
            EventKind::TaskCompleted => {
                info!(
                    task,
                    task_id,
                    worker = e.worker,
                    duration_ms = e.duration_ms,
                    "task completed"
                );
            }
            EventKind::TaskFailed => {
                warn!(
                    task,
                    task_id,
                    worker = e.worker,
                    duration_ms = e.duration_ms,
                    reason,
                    "task failed"
                );
            }
            EventKind::TaskRecorded => {
                debug!(task, task_id, outstanding = e.outstanding, "task recorded");
            }
            EventKind::ShutdownRequested => {
                info!(outstanding = e.outstanding, "shutdown requested");
            }
            EventKind::DrainPolling => {
                debug!(
                    attempt = e.attempt,
                    outstanding = e.outstanding,
                    delay_ms = e.delay_ms,
                    "drain poll"
                );
            }
            EventKind::DrainExceeded => {
                error!(
                    attempts = e.attempt,
                    outstanding = e.outstanding,
                    reason,
                    "drain budget exceeded; terminating workers anyway"
                );
            }
            EventKind::PoolTerminated => {
                info!(outstanding = e.outstanding, "pool terminated");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = task, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = task, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
