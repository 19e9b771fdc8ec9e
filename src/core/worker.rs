//! # Worker: runs queued tasks one at a time.
//!
//! A worker alternates between offering itself to the dispatcher and running the task it
//! receives. Cancellation of its token is observed **only between tasks**: a task that has
//! started always runs to completion.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► token cancelled?                        → exit
//!   ├─► offer Slot { worker, oneshot tx } on the ready queue
//!   ├─► select (biased):
//!   │     ├─ token cancelled                    → close slot;
//!   │     │                                       run a task that was already handed over;
//!   │     │                                       exit
//!   │     └─ task arrives on the slot           → execute
//!   └─► execute:
//!         ├─► publish TaskStarting
//!         ├─► task.run(worker)  (panics caught)
//!         ├─► publish TaskCompleted / TaskFailed
//!         └─► send TaskStatus to the aggregator
//! }
//! on exit: live_workers -= 1, publish WorkerStopped
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::core::dispatcher::Slot;
use crate::core::state::Shared;
use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::tasks::{QueuedTask, TaskStatus, executor_label};

/// One worker routine.
pub(crate) struct Worker {
    id: usize,
    shared: Arc<Shared>,
    ready: mpsc::UnboundedSender<Slot>,
    statuses: mpsc::Sender<TaskStatus>,
    token: CancellationToken,
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        shared: Arc<Shared>,
        ready: mpsc::UnboundedSender<Slot>,
        statuses: mpsc::Sender<TaskStatus>,
        token: CancellationToken,
    ) -> Self {
        Self {
            id,
            shared,
            ready,
            statuses,
            token,
        }
    }

    /// Runs until the token is cancelled or the dispatcher is gone.
    ///
    /// The live worker count must already include this worker.
    pub(crate) async fn run(self) {
        loop {
            if self.token.is_cancelled() {
                break;
            }

            let (tx, mut rx) = oneshot::channel();
            if self.ready.send(Slot::new(self.id, tx)).is_err() {
                break;
            }

            let queued = tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    rx.close();
                    if let Ok(queued) = rx.try_recv() {
                        self.execute(queued).await;
                    }
                    break;
                }
                res = &mut rx => match res {
                    Ok(queued) => queued,
                    Err(_dispatcher_gone) => break,
                },
            };
            self.execute(queued).await;
        }

        let live = self.shared.worker_stopped();
        self.shared.bus.publish(
            Event::new(EventKind::WorkerStopped)
                .with_worker(self.id)
                .with_live_workers(live),
        );
    }

    async fn execute(&self, queued: QueuedTask) {
        let QueuedTask {
            id,
            task,
            assigned_at,
        } = queued;
        let name = task.name().to_string();

        self.shared.bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_task(name.as_str())
                .with_task_id(id)
                .with_worker(self.id),
        );

        let started_at = SystemTime::now();
        let clock = Instant::now();
        let res = AssertUnwindSafe(task.run(self.id)).catch_unwind().await;
        let duration = clock.elapsed();

        let (output, error) = match res {
            Ok(Ok(output)) => (Some(output), None),
            Ok(Err(e)) => (None, Some(e)),
            Err(panic) => (None, Some(TaskError::from_panic(panic.as_ref()))),
        };

        let ev = match &error {
            None => Event::new(EventKind::TaskCompleted),
            Some(e) => Event::new(EventKind::TaskFailed).with_reason(e.to_string()),
        };
        self.shared.bus.publish(
            ev.with_task(name.as_str())
                .with_task_id(id)
                .with_worker(self.id)
                .with_duration(duration),
        );

        let status = TaskStatus {
            id,
            name,
            error,
            output,
            executor: executor_label(self.id),
            worker: self.id,
            assigned_at,
            started_at,
            duration,
        };
        if self.statuses.send(status).await.is_err() {
            // Aggregator outlives every worker; reaching this means the pool is being torn down.
            tracing::warn!(worker = self.id, task_id = id.seq(), "status dropped: aggregator gone");
        }
    }
}
