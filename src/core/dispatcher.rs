//! # Dispatcher: task intake and hand-off to workers.
//!
//! The hand-off is a **rendezvous**: idle workers post a one-shot [`Slot`] on the ready queue,
//! and `dispatch` waits for the next slot and puts the task into it. A caller is therefore
//! suspended until some worker is ready, which is the pool's only backpressure mechanism;
//! there is no buffer of accepted-but-unassigned tasks.
//!
//! ## Flow
//! ```text
//! dispatch(task)
//!   ├─► pool draining/terminated?  → Err(Rejected { state })
//!   ├─► id = next sequence number, outstanding += 1
//!   └─► loop:
//!         ├─► slot = ready.recv()   (suspends until a worker is idle)
//!         │     └─ None (all workers gone) → outstanding -= 1, Err(Closed)
//!         └─► slot.put(task)
//!               ├─ Ok            → publish TaskDispatched, Ok(id)
//!               └─ Err(task)     → the worker retired meanwhile; try the next slot
//! ```
//!
//! ## Rules
//! - Ids come from a per-pool counter: unique, and increasing in dispatch order.
//! - A stale slot (its worker retired or was terminated) gives the task back, so a task is
//!   never lost between dispatcher and worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc, oneshot};

use crate::core::state::Shared;
use crate::error::PoolError;
use crate::events::{Event, EventKind};
use crate::tasks::{QueuedTask, TaskId, TaskRef};

/// A worker's offer to take exactly one task.
pub(crate) struct Slot {
    worker: usize,
    tx: oneshot::Sender<QueuedTask>,
}

impl Slot {
    pub(crate) fn new(worker: usize, tx: oneshot::Sender<QueuedTask>) -> Self {
        Self { worker, tx }
    }

    /// Hands `task` to the worker; gives it back if the worker stopped waiting.
    pub(crate) fn put(self, task: QueuedTask) -> Result<usize, QueuedTask> {
        let worker = self.worker;
        self.tx.send(task).map(|()| worker)
    }
}

/// Public intake of the pool.
pub(crate) struct Dispatcher {
    shared: Arc<Shared>,
    sequence: AtomicU64,
    ready: Mutex<mpsc::UnboundedReceiver<Slot>>,
}

impl Dispatcher {
    pub(crate) fn new(shared: Arc<Shared>, ready: mpsc::UnboundedReceiver<Slot>) -> Self {
        Self {
            shared,
            sequence: AtomicU64::new(0),
            ready: Mutex::new(ready),
        }
    }

    /// Accepts `task` and waits until a worker takes it.
    pub(crate) async fn dispatch(&self, task: TaskRef) -> Result<TaskId, PoolError> {
        let state = self.shared.state();
        if state.is_closing() {
            self.shared.bus.publish(
                Event::new(EventKind::TaskRejected)
                    .with_task(task.name())
                    .with_reason(state.to_string()),
            );
            return Err(PoolError::Rejected { state });
        }

        let id = TaskId::new(self.sequence.fetch_add(1, Ordering::SeqCst));
        let name: Arc<str> = Arc::from(task.name());
        let outstanding = self.shared.task_accepted();
        let mut queued = QueuedTask::new(id, task);

        let mut ready = self.ready.lock().await;
        let worker = loop {
            let Some(slot) = ready.recv().await else {
                drop(ready);
                self.shared.task_settled();
                return Err(PoolError::Closed);
            };
            match slot.put(queued) {
                Ok(worker) => break worker,
                Err(back) => queued = back,
            }
        };
        drop(ready);

        self.shared.bus.publish(
            Event::new(EventKind::TaskDispatched)
                .with_task(name)
                .with_task_id(id)
                .with_worker(worker)
                .with_outstanding(outstanding),
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskFn;
    use crate::events::Bus;
    use crate::tasks::TaskOutput;

    fn noop() -> TaskRef {
        TaskFn::arc("noop", |_worker: usize| async { Ok::<_, crate::TaskError>(TaskOutput::Null) })
    }

    fn dispatcher() -> (Arc<Shared>, Dispatcher, mpsc::UnboundedSender<Slot>) {
        let shared = Arc::new(Shared::new(Bus::new(8)));
        shared.lifecycle.start();
        let (tx, rx) = mpsc::unbounded_channel();
        (shared.clone(), Dispatcher::new(shared, rx), tx)
    }

    #[tokio::test]
    async fn test_stale_slot_is_skipped() {
        let (shared, d, ready) = dispatcher();

        let (stale_tx, stale_rx) = oneshot::channel();
        drop(stale_rx);
        ready.send(Slot::new(1, stale_tx)).unwrap();

        let (live_tx, live_rx) = oneshot::channel();
        ready.send(Slot::new(2, live_tx)).unwrap();

        let id = d.dispatch(noop()).await.unwrap();
        assert_eq!(id, TaskId::new(0));
        assert_eq!(live_rx.await.unwrap().id, id);
        assert_eq!(shared.outstanding(), 1);
    }

    #[tokio::test]
    async fn test_closed_ready_queue_restores_outstanding() {
        let (shared, d, ready) = dispatcher();
        drop(ready);

        assert_eq!(d.dispatch(noop()).await, Err(PoolError::Closed));
        assert_eq!(shared.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_rejected_while_draining() {
        let (shared, d, _ready) = dispatcher();
        assert!(shared.lifecycle.begin_drain());

        let err = d.dispatch(noop()).await.unwrap_err();
        assert_eq!(
            err,
            PoolError::Rejected {
                state: crate::PoolState::Draining
            }
        );
        assert_eq!(shared.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_ids_follow_dispatch_order() {
        let (_shared, d, ready) = dispatcher();
        let mut receivers = Vec::new();
        for w in 0..3 {
            let (tx, rx) = oneshot::channel();
            ready.send(Slot::new(w, tx)).unwrap();
            receivers.push(rx);
        }
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(d.dispatch(noop()).await.unwrap().seq());
        }
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
