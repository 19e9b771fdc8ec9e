use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::{
    aggregator::Aggregator,
    config::PoolConfig,
    controller::{Controller, Routine},
    dispatcher::Dispatcher,
    pool::Pool,
    state::Shared,
};
use crate::{
    error::PoolError,
    events::{Bus, Event},
    subscribers::{Subscribe, SubscriberSet},
};

/// Capacity of the command queue between the pool handle and its controller.
const CONTROL_CAPACITY: usize = 16;

/// Builder for constructing a [`Pool`] with optional subscribers.
pub struct PoolBuilder {
    cfg: PoolConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl PoolBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: PoolConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive pool events (worker lifecycle, task outcomes, drain progress)
    /// through dedicated workers with bounded queues. An empty list disables logging.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the pool and starts its routines.
    ///
    /// This consumes the builder and:
    /// - normalizes the configuration (fails fast with [`PoolError::InvalidConfig`]);
    /// - starts the subscriber listener and the result aggregator;
    /// - spawns `min_workers` workers and moves the pool to `Running`.
    ///
    /// Must be called within a tokio runtime.
    pub fn build(self) -> Result<Pool, PoolError> {
        let cfg = self.cfg.normalized()?;

        let bus = Bus::new(cfg.bus_capacity);
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let shared = Arc::new(Shared::new(bus.clone()));
        let tracker = TaskTracker::new();
        let finished = CancellationToken::new();

        tracker.spawn(subscriber_listener(bus.subscribe(), subs, finished.clone()));

        let (ready_tx, ready_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = mpsc::channel(cfg.status_capacity);
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);

        let aggregator_token = CancellationToken::new();
        let aggregator = Aggregator::new(Arc::clone(&shared), status_rx, aggregator_token.clone());
        let aggregator_join = tracker.spawn(aggregator.run());

        let mut controller = Controller::new(
            cfg.clone(),
            Arc::clone(&shared),
            tracker.clone(),
            ready_tx,
            status_tx,
            Routine {
                token: aggregator_token,
                join: aggregator_join,
            },
            finished,
        );
        controller.scale_up(cfg.min_workers);
        shared.lifecycle.start();
        tracker.spawn(controller.run(control_rx));

        let dispatcher = Dispatcher::new(Arc::clone(&shared), ready_rx);
        Ok(Pool::new_internal(cfg, shared, dispatcher, control_tx, tracker))
    }
}

/// Forwards bus events to the subscriber set until the pool has terminated.
///
/// Once `finished` fires, events still buffered on the bus are delivered and the
/// subscriber queues are flushed before returning.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    subs: SubscriberSet,
    finished: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            res = rx.recv() => match res {
                Ok(ev) => subs.emit(&ev),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = finished.cancelled() => {
                loop {
                    match rx.try_recv() {
                        Ok(ev) => subs.emit(&ev),
                        Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                        }
                        Err(_) => break,
                    }
                }
                break;
            }
        }
    }
    subs.shutdown().await;
}
