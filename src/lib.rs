//! # taskpool
//!
//! **Taskpool** is a bounded, resizable worker pool for async tasks.
//!
//! Callers dispatch independent units of work; a set of worker routines runs them one at
//! a time each, and every outcome (output or error, timing, which worker ran it) is
//! recorded in an append-only history. Shutdown stops intake, waits for outstanding work
//! with an interval that adapts to the observed task duration, and terminates every
//! routine.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            dispatch(task)                         scale_up(n) / retire(n) / shutdown()
//!                  │                                              │
//!                  ▼                                              ▼
//!     ┌──────────────────────────┐                ┌──────────────────────────────┐
//!     │        Dispatcher        │                │          Controller          │
//!     │ - reject when closing    │                │ - spawn within [min, max]    │
//!     │ - TaskId, outstanding+1  │                │ - retire newest workers      │
//!     └────────────┬─────────────┘                │ - drain, then terminate      │
//!                  │ rendezvous slot              └──────────────┬───────────────┘
//!                  ▼                                             │ per-worker tokens
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐     │
//!     │   Worker 1   │   │   Worker 2   │   │   Worker N   │ ◄───┘
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼ TaskStatus (bounded queue)
//!                  ┌──────────────────────────┐
//!                  │        Aggregator        │
//!                  │ - history.push(status)   │
//!                  │ - outstanding-1          │
//!                  └──────────────────────────┘
//!
//! Every routine publishes Events ──► Bus ──► listener ──► SubscriberSet ──► Subscribe impls
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──build()──► Running ──shutdown()──► Draining ──all routines joined──► Terminated
//!
//! shutdown():
//!   ├─► Running → Draining (dispatch rejects from here on)
//!   ├─► poll outstanding up to `drain.attempts` times,
//!   │     waiting mean(history durations) between polls (fallback while empty)
//!   │     └─ budget exhausted → DrainExceeded (termination proceeds)
//!   ├─► cancel worker tokens, join workers (running tasks finish first)
//!   ├─► cancel aggregator, join it (already-queued statuses are recorded)
//!   └─► Terminated
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                     |
//! |-------------------|---------------------------------------------------------------|----------------------------------------|
//! | **Pool**          | Dispatch, scale, shut down, inspect.                          | [`Pool`], [`PoolBuilder`], [`PoolState`] |
//! | **Tasks**         | Define tasks as trait objects or closures.                    | [`Task`], [`TaskFn`], [`TaskRef`]      |
//! | **Results**       | Per-task outcome records in completion order.                 | [`TaskStatus`], [`History`]            |
//! | **Subscriber API**| Hook into pool events (logging, metrics, custom subscribers). | [`Subscribe`], [`Event`]               |
//! | **Policies**      | Configure the shutdown drain.                                 | [`DrainPolicy`]                        |
//! | **Errors**        | Typed errors for the pool and for task execution.             | [`PoolError`], [`TaskError`]           |
//! | **Configuration** | Centralize pool settings.                                     | [`PoolConfig`]                         |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], which forwards events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskpool::{Pool, PoolConfig, TaskError, TaskFn, TaskOutput, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = PoolConfig::new(2, 4, Duration::from_millis(200));
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskpool::Subscribe>> = vec![Arc::new(taskpool::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskpool::Subscribe>> = Vec::new();
//!
//!     let pool = Pool::builder(cfg).with_subscribers(subs).build()?;
//!
//!     let hello: TaskRef = TaskFn::arc("hello", |worker: usize| async move {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!         Ok::<_, TaskError>(TaskOutput::from(format!("hello from worker {worker}")))
//!     });
//!     let id = pool.dispatch(hello).await?;
//!
//!     pool.shutdown().await?;
//!     let results = pool.results().await;
//!     let status = &results[0];
//!     assert_eq!(status.id, id);
//!     assert!(status.is_ok());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{History, Pool, PoolBuilder, PoolConfig, PoolState};
pub use error::{PoolError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::DrainPolicy;
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskId, TaskOutput, TaskRef, TaskStatus};

// Optional: expose the built-in `tracing` subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
