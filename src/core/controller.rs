//! # Controller: owns worker routines, scaling and the shutdown drain.
//!
//! The controller is the only routine that spawns or stops workers. The pool façade
//! talks to it through a bounded command queue ([`Control`]); replies travel back on
//! one-shot channels.
//!
//! ## Commands
//! ```text
//! Spawn  { count } ─► spawn up to `count` workers, never above max_workers ─► reply(spawned)
//! Retire { count } ─► cancel up to `count` newest workers, never below min_workers,
//!                     wait until they exited ─► reply(retired)
//! Shutdown         ─► drain ─► terminate ─► exit
//! (queue closed)   ─► terminate without draining ─► exit
//! ```
//!
//! ## Drain
//! ```text
//! for attempt in 1..=attempts:
//!   outstanding == 0?           → done
//!   wait interval(mean duration)  (ends early when outstanding reaches 0)
//! outstanding still > 0         → DrainExceeded (termination proceeds anyway)
//! ```
//!
//! ## Terminate
//! Cancels the pool kill token (every worker's token is a child of it), joins every
//! worker, then cancels and joins the aggregator. The outcome is recorded before the
//! lifecycle moves to `Terminated`; the `finished` token is cancelled after the final
//! `PoolTerminated` event was published.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::core::config::PoolConfig;
use crate::core::dispatcher::Slot;
use crate::core::state::Shared;
use crate::core::worker::Worker;
use crate::error::PoolError;
use crate::events::{Event, EventKind};
use crate::tasks::TaskStatus;

/// Request sent from the pool façade to the controller.
pub(crate) enum Control {
    Spawn {
        count: usize,
        reply: oneshot::Sender<usize>,
    },
    Retire {
        count: usize,
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

/// A spawned routine and the token that stops it.
pub(crate) struct Routine {
    pub(crate) token: CancellationToken,
    pub(crate) join: JoinHandle<()>,
}

pub(crate) struct Controller {
    cfg: PoolConfig,
    shared: Arc<Shared>,
    tracker: TaskTracker,
    ready: mpsc::UnboundedSender<Slot>,
    statuses: mpsc::Sender<TaskStatus>,
    kill: CancellationToken,
    workers: BTreeMap<usize, Routine>,
    sequence: usize,
    aggregator: Routine,
    finished: CancellationToken,
}

impl Controller {
    pub(crate) fn new(
        cfg: PoolConfig,
        shared: Arc<Shared>,
        tracker: TaskTracker,
        ready: mpsc::UnboundedSender<Slot>,
        statuses: mpsc::Sender<TaskStatus>,
        aggregator: Routine,
        finished: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            shared,
            tracker,
            ready,
            statuses,
            kill: CancellationToken::new(),
            workers: BTreeMap::new(),
            sequence: 0,
            aggregator,
            finished,
        }
    }

    /// Serves commands until shutdown, or until the pool handle is gone.
    pub(crate) async fn run(mut self, mut control: mpsc::Receiver<Control>) {
        loop {
            match control.recv().await {
                Some(Control::Spawn { count, reply }) => {
                    let _ = reply.send(self.scale_up(count));
                }
                Some(Control::Retire { count, reply }) => {
                    let _ = reply.send(self.retire(count).await);
                }
                Some(Control::Shutdown) => {
                    let outcome = self.drain().await;
                    self.terminate(outcome).await;
                    return;
                }
                None => {
                    tracing::debug!("pool handle dropped; terminating without drain");
                    self.shared.lifecycle.begin_drain();
                    self.terminate(Ok(())).await;
                    return;
                }
            }
        }
    }

    /// Spawns up to `count` workers without exceeding `max_workers`.
    pub(crate) fn scale_up(&mut self, count: usize) -> usize {
        if self.shared.state().is_closing() {
            return 0;
        }
        let room = self.cfg.max_workers.saturating_sub(self.workers.len());
        let spawned = count.min(room);
        for _ in 0..spawned {
            self.spawn_worker();
        }
        if spawned < count {
            self.shared.bus.publish(
                Event::new(EventKind::ScaleLimited)
                    .with_live_workers(self.shared.live_workers())
                    .with_reason(format!(
                        "max_workers={} reached; spawned {spawned} of {count}",
                        self.cfg.max_workers
                    )),
            );
        }
        spawned
    }

    fn spawn_worker(&mut self) {
        self.sequence += 1;
        let id = self.sequence;
        let token = self.kill.child_token();

        let live = self.shared.worker_started();
        let worker = Worker::new(
            id,
            Arc::clone(&self.shared),
            self.ready.clone(),
            self.statuses.clone(),
            token.clone(),
        );
        let join = self.tracker.spawn(worker.run());
        self.workers.insert(id, Routine { token, join });

        self.shared.bus.publish(
            Event::new(EventKind::WorkerSpawned)
                .with_worker(id)
                .with_live_workers(live),
        );
    }

    /// Retires up to `count` of the most recently spawned workers, never going below
    /// `min_workers`. Returns once every selected worker has exited.
    async fn retire(&mut self, count: usize) -> usize {
        if self.shared.state().is_closing() {
            return 0;
        }
        let spare = self.workers.len().saturating_sub(self.cfg.min_workers);
        let wanted = count.min(spare);

        let mut retiring = Vec::with_capacity(wanted);
        while retiring.len() < wanted {
            let Some((id, routine)) = self.workers.pop_last() else {
                break;
            };
            routine.token.cancel();
            retiring.push((id, routine.join));
        }

        let retired = retiring.len();
        for (id, join) in retiring {
            join_worker(id, join).await;
        }
        if retired < count {
            self.shared.bus.publish(
                Event::new(EventKind::ScaleLimited)
                    .with_live_workers(self.shared.live_workers())
                    .with_reason(format!(
                        "min_workers={} reached; retired {retired} of {count}",
                        self.cfg.min_workers
                    )),
            );
        }
        retired
    }

    /// Waits for outstanding work within the drain budget.
    async fn drain(&mut self) -> Result<(), PoolError> {
        let policy = self.cfg.drain;
        let started = Instant::now();
        self.shared.bus.publish(
            Event::new(EventKind::ShutdownRequested).with_outstanding(self.shared.outstanding()),
        );

        for attempt in 1..=policy.attempts {
            let drained = self.shared.drained().notified();
            tokio::pin!(drained);
            drained.as_mut().enable();

            let outstanding = self.shared.outstanding();
            if outstanding == 0 {
                return Ok(());
            }

            let delay = policy.interval(self.shared.history.mean_duration().await);
            self.shared.bus.publish(
                Event::new(EventKind::DrainPolling)
                    .with_attempt(attempt)
                    .with_outstanding(outstanding)
                    .with_delay(delay),
            );
            tokio::select! {
                _ = &mut drained => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let outstanding = self.shared.outstanding();
        if outstanding == 0 {
            return Ok(());
        }
        let err = PoolError::DrainExceeded {
            attempts: policy.attempts,
            outstanding,
            waited: started.elapsed(),
        };
        self.shared.bus.publish(
            Event::new(EventKind::DrainExceeded)
                .with_attempt(policy.attempts)
                .with_outstanding(outstanding)
                .with_reason(err.to_string()),
        );
        Err(err)
    }

    /// Stops every routine and records the shutdown outcome.
    async fn terminate(self, outcome: Result<(), PoolError>) {
        let Controller {
            shared,
            ready,
            statuses,
            kill,
            workers,
            aggregator,
            finished,
            ..
        } = self;

        kill.cancel();
        for (id, routine) in workers {
            join_worker(id, routine.join).await;
        }
        drop(ready);
        drop(statuses);

        aggregator.token.cancel();
        if let Err(e) = aggregator.join.await {
            tracing::error!(error = %e, "aggregator routine failed");
        }

        let outstanding = shared.outstanding();
        shared.set_outcome(outcome);
        shared.lifecycle.terminate();
        shared.bus.publish(
            Event::new(EventKind::PoolTerminated)
                .with_outstanding(outstanding)
                .with_live_workers(shared.live_workers()),
        );
        finished.cancel();
    }
}

async fn join_worker(id: usize, join: JoinHandle<()>) {
    if let Err(e) = join.await {
        tracing::error!(worker = id, error = %e, "worker routine failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::Aggregator;
    use crate::events::Bus;
    use crate::policies::DrainPolicy;
    use crate::tasks::{TaskId, executor_label};
    use std::time::{Duration, SystemTime};

    fn controller(
        min: usize,
        max: usize,
    ) -> (Arc<Shared>, Controller, mpsc::UnboundedReceiver<Slot>) {
        let cfg = PoolConfig {
            min_workers: min,
            max_workers: max,
            drain: DrainPolicy {
                attempts: 3,
                fallback: Duration::from_millis(10),
                floor: Duration::from_millis(1),
            },
            ..PoolConfig::default()
        };
        let shared = Arc::new(Shared::new(Bus::new(64)));
        let tracker = TaskTracker::new();
        let (ready, ready_rx) = mpsc::unbounded_channel();
        let (statuses, status_rx) = mpsc::channel(4);

        let token = CancellationToken::new();
        let join = tracker.spawn(Aggregator::new(shared.clone(), status_rx, token.clone()).run());

        shared.lifecycle.start();
        let ctl = Controller::new(
            cfg,
            shared.clone(),
            tracker,
            ready,
            statuses,
            Routine { token, join },
            CancellationToken::new(),
        );
        (shared, ctl, ready_rx)
    }

    #[tokio::test]
    async fn test_scale_up_capped_at_max() {
        let (shared, mut ctl, _ready) = controller(1, 3);
        let mut rx = shared.bus.subscribe();

        assert_eq!(ctl.scale_up(2), 2);
        assert_eq!(ctl.scale_up(5), 1);
        assert_eq!(shared.live_workers(), 3);

        let mut limited = false;
        while let Ok(ev) = rx.try_recv() {
            limited |= ev.kind == EventKind::ScaleLimited;
        }
        assert!(limited);
    }

    #[tokio::test]
    async fn test_retire_stops_newest_and_keeps_min() {
        let (shared, mut ctl, _ready) = controller(2, 4);
        ctl.scale_up(4);

        assert_eq!(ctl.retire(10).await, 2);
        assert_eq!(shared.live_workers(), 2);
        let left: Vec<usize> = ctl.workers.keys().copied().collect();
        assert_eq!(left, vec![1, 2]);

        assert_eq!(ctl.retire(1).await, 0);
    }

    #[tokio::test]
    async fn test_drain_budget_exhausted() {
        let (shared, mut ctl, _ready) = controller(1, 1);
        shared.task_accepted();
        shared.lifecycle.begin_drain();

        let err = ctl.drain().await.unwrap_err();
        assert!(matches!(
            err,
            PoolError::DrainExceeded {
                attempts: 3,
                outstanding: 1,
                ..
            }
        ));
        shared.task_settled();
    }

    #[tokio::test]
    async fn test_drain_interval_follows_history_mean() {
        let (shared, mut ctl, _ready) = controller(1, 1);
        ctl.cfg.drain.fallback = Duration::from_secs(5);
        shared
            .history
            .push(TaskStatus {
                id: TaskId::new(0),
                name: "done".into(),
                error: None,
                output: None,
                executor: executor_label(1),
                worker: 1,
                assigned_at: SystemTime::now(),
                started_at: SystemTime::now(),
                duration: Duration::from_millis(40),
            })
            .await;
        shared.task_accepted();
        shared.lifecycle.begin_drain();
        let mut rx = shared.bus.subscribe();

        let started = Instant::now();
        let err = ctl.drain().await.unwrap_err();
        assert!(matches!(err, PoolError::DrainExceeded { attempts: 3, .. }));
        assert!(started.elapsed() < Duration::from_secs(1));

        let mut delays = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::DrainPolling {
                delays.push(ev.delay_ms);
            }
        }
        assert_eq!(delays, vec![Some(40); 3]);
        shared.task_settled();
    }

    #[tokio::test]
    async fn test_terminate_records_outcome() {
        let (shared, mut ctl, _ready) = controller(2, 2);
        ctl.scale_up(2);
        shared.lifecycle.begin_drain();

        let outcome = ctl.drain().await;
        assert_eq!(outcome, Ok(()));
        ctl.terminate(outcome).await;

        assert_eq!(shared.state(), crate::PoolState::Terminated);
        assert_eq!(shared.live_workers(), 0);
        assert_eq!(shared.outcome(), Some(Ok(())));
    }
}
