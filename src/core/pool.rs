//! # Pool: public façade over dispatcher, controller, workers and aggregator.
//!
//! A [`Pool`] runs submitted [`Task`](crate::Task)s on a bounded, resizable set of worker
//! routines and records every outcome in its [`History`].
//!
//! ## High-level architecture
//! ```text
//!   dispatch(task) ──► Dispatcher ──(rendezvous slot)──► Worker 1..N ──► TaskStatus
//!                        │                                  ▲               │
//!                        │ outstanding += 1                 │ spawn/retire  ▼
//!                        │                              Controller      Aggregator
//!   scale_up / retire ───┼──────────(Control queue)──────►  │            history.push
//!   shutdown ────────────┘                                  │            outstanding -= 1
//!                                                           ▼
//!                                      drain (adaptive poll) ─► terminate ─► Terminated
//!
//!   every routine ── publish(Event) ──► Bus ──► listener ──► SubscriberSet ──► Subscribe
//! ```
//!
//! ## Guarantees
//! - `dispatch` returning `Ok(id)` means the task will run exactly once and its status
//!   will appear in history exactly once (before `shutdown` returns).
//! - Once shutdown was requested every `dispatch` fails with [`PoolError::Rejected`].
//! - The live worker count stays within `[min_workers, max_workers]` while running.
//! - A running task is never interrupted; termination happens between tasks.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{Pool, TaskError, TaskFn, TaskOutput};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = Pool::new(2, 4, Duration::from_millis(100), Vec::new())?;
//!
//!     for n in 0..8u64 {
//!         let task = TaskFn::arc("square", move |_worker: usize| async move {
//!             Ok::<_, TaskError>(TaskOutput::from(n * n))
//!         });
//!         pool.dispatch(task).await?;
//!     }
//!
//!     pool.shutdown().await?;
//!     let results = pool.results().await;
//!     assert_eq!(results.len(), 8);
//!     assert!(results.iter().all(|s| s.is_ok()));
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::task::TaskTracker;

use super::{
    builder::PoolBuilder,
    config::PoolConfig,
    controller::Control,
    dispatcher::Dispatcher,
    history::History,
    state::{PoolState, Shared},
};
use crate::error::PoolError;
use crate::subscribers::Subscribe;
use crate::tasks::{TaskId, TaskRef, TaskStatus};

/// Worker pool handle.
///
/// Dropping the handle without calling [`shutdown`](Pool::shutdown) terminates the
/// workers without waiting for outstanding work.
pub struct Pool {
    cfg: PoolConfig,
    shared: Arc<Shared>,
    dispatcher: Dispatcher,
    control: mpsc::Sender<Control>,
    tracker: TaskTracker,
}

impl Pool {
    /// Creates a running pool with `min..=max` workers.
    ///
    /// `fallback` is the drain poll interval used while no task has completed yet;
    /// other settings come from [`PoolConfig::default`].
    ///
    /// Must be called within a tokio runtime.
    pub fn new(
        min_workers: usize,
        max_workers: usize,
        fallback: Duration,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, PoolError> {
        PoolBuilder::new(PoolConfig::new(min_workers, max_workers, fallback))
            .with_subscribers(subscribers)
            .build()
    }

    /// Creates a builder for a pool with the given configuration.
    pub fn builder(cfg: PoolConfig) -> PoolBuilder {
        PoolBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: PoolConfig,
        shared: Arc<Shared>,
        dispatcher: Dispatcher,
        control: mpsc::Sender<Control>,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            cfg,
            shared,
            dispatcher,
            control,
            tracker,
        }
    }

    /// Submits a task and waits until a worker has taken it.
    ///
    /// # Errors
    /// - [`PoolError::Rejected`] if shutdown was requested; nothing is recorded.
    /// - [`PoolError::Closed`] if every worker is gone.
    pub async fn dispatch(&self, task: TaskRef) -> Result<TaskId, PoolError> {
        self.dispatcher.dispatch(task).await
    }

    /// Stops intake, drains outstanding work and terminates every routine.
    ///
    /// Safe to call more than once and from several tasks at the same time: every
    /// caller waits for the same termination and gets the same outcome.
    ///
    /// # Errors
    /// [`PoolError::DrainExceeded`] if work was still outstanding when the drain budget
    /// ran out. The pool is terminated anyway, and tasks that were already running
    /// still finish and appear in history.
    pub async fn shutdown(&self) -> Result<(), PoolError> {
        if self.shared.lifecycle.begin_drain() {
            let _ = self.control.send(Control::Shutdown).await;
        }
        self.tracker.close();
        self.tracker.wait().await;
        self.shared.outcome().unwrap_or(Err(PoolError::Closed))
    }

    /// Spawns up to `count` additional workers, never exceeding `max_workers`.
    ///
    /// Returns the number of workers actually spawned.
    pub async fn scale_up(&self, count: usize) -> Result<usize, PoolError> {
        self.request(|reply| Control::Spawn { count, reply }).await
    }

    /// Retires up to `count` workers, never going below `min_workers`.
    ///
    /// A busy worker finishes its current task first. Returns the number of workers
    /// retired, once all of them have exited.
    pub async fn retire(&self, count: usize) -> Result<usize, PoolError> {
        self.request(|reply| Control::Retire { count, reply }).await
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<usize>) -> Control,
    ) -> Result<usize, PoolError> {
        let state = self.shared.state();
        if state != PoolState::Running {
            return Err(PoolError::Rejected { state });
        }
        let (tx, rx) = oneshot::channel();
        self.control
            .send(make(tx))
            .await
            .map_err(|_| PoolError::Closed)?;
        rx.await.map_err(|_| PoolError::Closed)
    }

    /// Snapshot of every recorded status, in completion order.
    pub async fn results(&self) -> Vec<TaskStatus> {
        self.shared.history.snapshot().await
    }

    /// Shared handle to the pool history.
    pub fn history(&self) -> History {
        self.shared.history.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PoolState {
        self.shared.state()
    }

    /// Number of worker routines currently alive.
    pub fn live_workers(&self) -> usize {
        self.shared.live_workers()
    }

    /// Number of tasks accepted but not yet recorded.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding()
    }

    /// Normalized configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.cfg
    }
}
