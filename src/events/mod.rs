//! Pool events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to publish and
//! subscribe to events emitted by the dispatcher, workers, aggregator and controller.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Dispatcher`, `Worker`, `Aggregator`, `Controller`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the pool's subscriber listener, which fans out to the
//!   [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
