//! Pool core: routines, shared state and lifecycle.
//!
//! The public API from this module is [`Pool`] (built directly or through [`PoolBuilder`]),
//! its configuration [`PoolConfig`], lifecycle [`PoolState`] and the [`History`] of
//! completed tasks.
//!
//! Internal modules:
//! - [`dispatcher`]: task intake and rendezvous hand-off to idle workers;
//! - [`worker`]: runs queued tasks one at a time, reports a status per task;
//! - [`aggregator`]: single writer of history, settles the outstanding count;
//! - [`controller`]: spawns/retires workers, drains and terminates the pool;
//! - [`state`]: lifecycle and counters shared by every routine.

mod aggregator;
mod builder;
mod config;
mod controller;
mod dispatcher;
mod history;
mod pool;
mod state;
mod worker;

pub use builder::PoolBuilder;
pub use config::PoolConfig;
pub use history::History;
pub use pool::Pool;
pub use state::PoolState;
