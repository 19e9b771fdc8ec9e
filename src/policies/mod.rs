//! Shutdown policies.
//!
//! This module groups the knobs that control **how long** the pool waits for outstanding
//! work during shutdown before terminating its workers.
//!
//! ## Contents
//! - [`DrainPolicy`] poll budget and adaptive poll interval (mean task duration / fallback)
//!
//! ## Quick wiring
//! ```text
//! PoolConfig { drain: DrainPolicy, .. }
//!      └─► core::controller::Controller::drain uses:
//!           - drain.attempts to bound the number of polls
//!           - drain.interval(history.mean_duration()) to wait between polls
//! ```
//!
//! ## Defaults
//! - `DrainPolicy::default()` → attempts=30, fallback=1s, floor=1ms.

mod drain;

pub use drain::DrainPolicy;
