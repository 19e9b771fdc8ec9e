//! # Pool configuration.
//!
//! Provides [`PoolConfig`] centralized settings for a pool instance.
//!
//! Config is used in two ways:
//! 1. **Pool creation**: `Pool::builder(config).build()`
//! 2. **Shorthand**: `Pool::new(min, max, fallback, subscribers)` fills the rest from
//!    [`PoolConfig::default`].
//!
//! ## Normalization
//! [`PoolConfig::normalized`] applies the sizing rules before a pool is built:
//! - `min_workers < 1` → `1`
//! - `max_workers < min_workers` → `min_workers` is lowered to `max_workers`
//! - `max_workers = 0` → rejected (such a pool could never run a task)

use std::time::Duration;

use crate::error::PoolError;
use crate::policies::DrainPolicy;

/// Configuration for a pool.
///
/// ## Field semantics
/// - `min_workers`: workers started at construction; retirement never goes below it
/// - `max_workers`: hard ceiling for the live worker count
/// - `drain`: shutdown poll budget and adaptive interval
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `status_capacity`: completion queue between workers and the aggregator (min 1)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Minimum (and initial) number of workers.
    pub min_workers: usize,

    /// Maximum number of workers.
    pub max_workers: usize,

    /// Shutdown drain policy.
    pub drain: DrainPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers lagging more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Capacity of the completion queue feeding the result aggregator.
    ///
    /// When full, workers wait before picking up their next task.
    pub status_capacity: usize,
}

impl PoolConfig {
    /// Creates a config with the given worker bounds and drain fallback; other fields default.
    pub fn new(min_workers: usize, max_workers: usize, fallback: Duration) -> Self {
        Self {
            min_workers,
            max_workers,
            drain: DrainPolicy::with_fallback(fallback),
            ..Self::default()
        }
    }

    /// Returns a copy with the sizing rules applied, or an error if no working pool
    /// can be built from it.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use taskpool::PoolConfig;
    ///
    /// let cfg = PoolConfig::new(0, 3, Duration::from_secs(1)).normalized().unwrap();
    /// assert_eq!((cfg.min_workers, cfg.max_workers), (1, 3));
    ///
    /// let cfg = PoolConfig::new(8, 2, Duration::from_secs(1)).normalized().unwrap();
    /// assert_eq!((cfg.min_workers, cfg.max_workers), (2, 2));
    ///
    /// assert!(PoolConfig::new(1, 0, Duration::from_secs(1)).normalized().is_err());
    /// ```
    pub fn normalized(&self) -> Result<Self, PoolError> {
        if self.max_workers == 0 {
            return Err(PoolError::InvalidConfig {
                reason: "max_workers must be at least 1".to_string(),
            });
        }
        let mut cfg = self.clone();
        cfg.min_workers = cfg.min_workers.max(1).min(cfg.max_workers);
        cfg.bus_capacity = cfg.bus_capacity.max(1);
        cfg.status_capacity = cfg.status_capacity.max(1);
        Ok(cfg)
    }

    /// True if the pool cannot grow or shrink.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.min_workers == self.max_workers
    }
}

impl Default for PoolConfig {
    /// Default configuration:
    ///
    /// - `min_workers = 1`, `max_workers = 4`
    /// - `drain = DrainPolicy::default()` (30 polls, 1s fallback)
    /// - `bus_capacity = 1024`
    /// - `status_capacity = 64`
    fn default() -> Self {
        Self {
            min_workers: 1,
            max_workers: 4,
            drain: DrainPolicy::default(),
            bus_capacity: 1024,
            status_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_floored_to_one() {
        let cfg = PoolConfig::new(0, 5, Duration::from_secs(1))
            .normalized()
            .unwrap();
        assert_eq!(cfg.min_workers, 1);
        assert_eq!(cfg.max_workers, 5);
        assert!(!cfg.is_fixed());
    }

    #[test]
    fn test_max_below_min_lowers_min() {
        let cfg = PoolConfig::new(20, 3, Duration::from_secs(1))
            .normalized()
            .unwrap();
        assert_eq!(cfg.min_workers, 3);
        assert_eq!(cfg.max_workers, 3);
        assert!(cfg.is_fixed());
    }

    #[test]
    fn test_zero_max_rejected() {
        let err = PoolConfig::new(0, 0, Duration::from_secs(1))
            .normalized()
            .unwrap_err();
        assert_eq!(err.as_label(), "pool_invalid_config");
    }

    #[test]
    fn test_capacities_clamped() {
        let cfg = PoolConfig {
            bus_capacity: 0,
            status_capacity: 0,
            ..PoolConfig::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(cfg.bus_capacity, 1);
        assert_eq!(cfg.status_capacity, 1);
    }

    #[test]
    fn test_fallback_is_carried_into_drain_policy() {
        let cfg = PoolConfig::new(1, 1, Duration::from_millis(300));
        assert_eq!(cfg.drain.fallback, Duration::from_millis(300));
        assert_eq!(cfg.drain.attempts, DrainPolicy::default().attempts);
    }
}
