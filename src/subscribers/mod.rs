//! # Event subscribers: the pool's logging collaborator.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations for handling
//! pool events broadcast through the [`Bus`](crate::Bus). The pool never depends on a
//! subscriber for correctness; an empty subscriber list is a valid no-op logger.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Worker ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet::emit
//!                                                                  │
//!                                                     ┌────────────┼────────────┐
//!                                                     ▼            ▼            ▼
//!                                                 LogWriter     Metrics      Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
