//! # Drain policy for graceful shutdown.
//!
//! [`DrainPolicy`] decides how the controller polls the outstanding-task count after a
//! shutdown request. It is parameterized by:
//! - [`DrainPolicy::attempts`] the maximum number of polls;
//! - [`DrainPolicy::fallback`] the poll interval used while no task has completed yet;
//! - [`DrainPolicy::floor`] the lower bound of any poll interval.
//!
//! The interval between polls adapts to the workload: it is the arithmetic mean of the
//! durations recorded in history, so a pool of short tasks shuts down quickly while a pool
//! of slow tasks is given proportionally more time. The budget is advisory: once it is
//! spent the pool terminates its workers anyway (a running task is still allowed to finish).
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::DrainPolicy;
//!
//! let drain = DrainPolicy {
//!     attempts: 30,
//!     fallback: Duration::from_secs(1),
//!     floor: Duration::from_millis(5),
//! };
//!
//! // No history yet: explicit fallback.
//! assert_eq!(drain.interval(None), Duration::from_secs(1));
//!
//! // Mean of recorded durations.
//! assert_eq!(drain.interval(Some(Duration::from_millis(120))), Duration::from_millis(120));
//!
//! // Instant tasks never turn the drain loop into a busy loop.
//! assert_eq!(drain.interval(Some(Duration::ZERO)), Duration::from_millis(5));
//!
//! // Upper bound of the whole drain phase.
//! assert_eq!(drain.budget(Some(Duration::from_millis(100))), Duration::from_secs(3));
//! ```

use std::time::Duration;

/// Shutdown drain policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrainPolicy {
    /// Maximum number of outstanding-count polls (`0` = do not wait at all).
    pub attempts: u32,
    /// Poll interval used while history is empty.
    pub fallback: Duration,
    /// Lower bound applied to every poll interval.
    pub floor: Duration,
}

impl Default for DrainPolicy {
    /// Returns a policy with:
    /// - `attempts = 30`;
    /// - `fallback = 1s`;
    /// - `floor = 1ms`.
    fn default() -> Self {
        Self {
            attempts: 30,
            fallback: Duration::from_secs(1),
            floor: Duration::from_millis(1),
        }
    }
}

impl DrainPolicy {
    /// Creates a policy with the default attempt budget and floor.
    pub fn with_fallback(fallback: Duration) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    /// Computes the wait before the next poll.
    ///
    /// `mean` is the mean duration of completed tasks, `None` when nothing completed yet.
    pub fn interval(&self, mean: Option<Duration>) -> Duration {
        mean.unwrap_or(self.fallback).max(self.floor)
    }

    /// Worst-case time spent polling for a fixed `mean`.
    pub fn budget(&self, mean: Option<Duration>) -> Duration {
        self.interval(mean).saturating_mul(self.attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_without_history() {
        let policy = DrainPolicy::with_fallback(Duration::from_millis(250));
        assert_eq!(policy.interval(None), Duration::from_millis(250));
        assert_eq!(policy.attempts, 30);
    }

    #[test]
    fn test_mean_wins_over_fallback() {
        let policy = DrainPolicy::with_fallback(Duration::from_secs(10));
        assert_eq!(
            policy.interval(Some(Duration::from_millis(40))),
            Duration::from_millis(40)
        );
    }

    #[test]
    fn test_floor_applies_to_fallback_too() {
        let policy = DrainPolicy {
            attempts: 3,
            fallback: Duration::ZERO,
            floor: Duration::from_millis(2),
        };
        assert_eq!(policy.interval(None), Duration::from_millis(2));
        assert_eq!(
            policy.interval(Some(Duration::from_micros(10))),
            Duration::from_millis(2)
        );
    }

    #[test]
    fn test_budget_saturates() {
        let policy = DrainPolicy {
            attempts: u32::MAX,
            fallback: Duration::MAX,
            floor: Duration::ZERO,
        };
        assert_eq!(policy.budget(None), Duration::MAX);
        assert_eq!(
            DrainPolicy {
                attempts: 0,
                ..DrainPolicy::default()
            }
            .budget(None),
            Duration::ZERO
        );
    }
}
