//! # Pool lifecycle and shared counters.
//!
//! [`Shared`] is the state every pool routine holds an `Arc` to:
//! - lifecycle state ([`PoolState`]) stored in an atomic;
//! - live worker count and outstanding task count (atomic increment/decrement only);
//! - the history and the event bus;
//! - the shutdown outcome, written once by the controller.
//!
//! ## Lifecycle
//! ```text
//! Idle ──(build)──► Running ──(shutdown)──► Draining ──(all routines exited)──► Terminated
//! ```
//! There are no transitions out of `Terminated`.

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::{Notify, OnceCell};

use crate::core::history::History;
use crate::error::PoolError;
use crate::events::Bus;

/// Lifecycle state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PoolState {
    /// Constructed, routines not started yet.
    Idle = 0,
    /// Accepting work.
    Running = 1,
    /// Shutdown requested: intake stopped, outstanding work draining.
    Draining = 2,
    /// All routines exited.
    Terminated = 3,
}

impl PoolState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => PoolState::Idle,
            1 => PoolState::Running,
            2 => PoolState::Draining,
            _ => PoolState::Terminated,
        }
    }

    /// True once shutdown was requested.
    #[inline]
    pub fn is_closing(self) -> bool {
        matches!(self, PoolState::Draining | PoolState::Terminated)
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PoolState::Idle => "idle",
            PoolState::Running => "running",
            PoolState::Draining => "draining",
            PoolState::Terminated => "terminated",
        })
    }
}

/// Atomic holder of a [`PoolState`].
pub(crate) struct Lifecycle(AtomicU8);

impl Lifecycle {
    fn new() -> Self {
        Self(AtomicU8::new(PoolState::Idle as u8))
    }

    pub(crate) fn load(&self) -> PoolState {
        PoolState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// `Idle → Running`.
    pub(crate) fn start(&self) -> bool {
        self.transition(PoolState::Idle, PoolState::Running)
    }

    /// `Running → Draining`; true only for the caller that performed the transition.
    pub(crate) fn begin_drain(&self) -> bool {
        self.transition(PoolState::Running, PoolState::Draining)
    }

    pub(crate) fn terminate(&self) {
        self.0.store(PoolState::Terminated as u8, Ordering::SeqCst);
    }

    fn transition(&self, from: PoolState, to: PoolState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// State shared by the pool façade and all of its routines.
pub(crate) struct Shared {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) bus: Bus,
    pub(crate) history: History,
    live_workers: AtomicUsize,
    outstanding: AtomicUsize,
    drained: Notify,
    outcome: OnceCell<Result<(), PoolError>>,
}

impl Shared {
    pub(crate) fn new(bus: Bus) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            bus,
            history: History::default(),
            live_workers: AtomicUsize::new(0),
            outstanding: AtomicUsize::new(0),
            drained: Notify::new(),
            outcome: OnceCell::new(),
        }
    }

    pub(crate) fn state(&self) -> PoolState {
        self.lifecycle.load()
    }

    pub(crate) fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    /// Returns the live count after the increment.
    pub(crate) fn worker_started(&self) -> usize {
        self.live_workers.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the live count after the decrement.
    pub(crate) fn worker_stopped(&self) -> usize {
        let prev = self.live_workers.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "live worker count underflow");
        prev - 1
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Returns the outstanding count after the increment.
    pub(crate) fn task_accepted(&self) -> usize {
        self.outstanding.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Balances one earlier [`task_accepted`](Self::task_accepted); wakes the drain loop at zero.
    ///
    /// Returns the outstanding count after the decrement.
    pub(crate) fn task_settled(&self) -> usize {
        let prev = self.outstanding.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "outstanding count underflow");
        let left = prev - 1;
        if left == 0 {
            self.drained.notify_waiters();
        }
        left
    }

    /// Notified whenever the outstanding count drops to zero.
    pub(crate) fn drained(&self) -> &Notify {
        &self.drained
    }

    pub(crate) fn set_outcome(&self, outcome: Result<(), PoolError>) {
        let _ = self.outcome.set(outcome);
    }

    pub(crate) fn outcome(&self) -> Option<Result<(), PoolError>> {
        self.outcome.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let lc = Lifecycle::new();
        assert_eq!(lc.load(), PoolState::Idle);
        assert!(!lc.begin_drain(), "cannot drain before running");

        assert!(lc.start());
        assert_eq!(lc.load(), PoolState::Running);
        assert!(!lc.start());

        assert!(lc.begin_drain());
        assert!(!lc.begin_drain(), "only one caller wins the drain transition");
        assert!(lc.load().is_closing());

        lc.terminate();
        assert_eq!(lc.load(), PoolState::Terminated);
        assert!(!lc.start());
        assert!(!lc.begin_drain());
    }

    #[test]
    fn test_counters() {
        let shared = Shared::new(Bus::new(1));
        assert_eq!(shared.task_accepted(), 1);
        assert_eq!(shared.task_accepted(), 2);
        assert_eq!(shared.task_settled(), 1);
        assert_eq!(shared.task_settled(), 0);
        assert_eq!(shared.outstanding(), 0);

        assert_eq!(shared.worker_started(), 1);
        assert_eq!(shared.worker_stopped(), 0);
        assert_eq!(shared.live_workers(), 0);
    }

    #[tokio::test]
    async fn test_drained_notification_at_zero() {
        let shared = Shared::new(Bus::new(1));
        shared.task_accepted();

        let notified = shared.drained().notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        shared.task_settled();
        tokio::time::timeout(std::time::Duration::from_secs(1), notified)
            .await
            .expect("drain notification");
    }

    #[test]
    fn test_outcome_written_once() {
        let shared = Shared::new(Bus::new(1));
        assert!(shared.outcome().is_none());
        shared.set_outcome(Ok(()));
        shared.set_outcome(Err(PoolError::Closed));
        assert_eq!(shared.outcome(), Some(Ok(())));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PoolState::Draining.to_string(), "draining");
        assert_eq!(
            serde_json::to_value(PoolState::Terminated).unwrap(),
            "terminated"
        );
    }
}
