//! # Coordinator: wires the table, the arbiter and the actors for one run.
//!
//! The [`Coordinator`] validates the [`Config`], spawns one arbiter and N actors,
//! waits for the arbiter to reach a terminal phase, joins the actors and makes sure
//! every subscriber has seen every event before returning the [`Outcome`].
//!
//! ## High-level architecture
//! ```text
//! Coordinator::run()
//!   │
//!   ├─ Config::validate()               ─► Err(ConfigError) before anything is spawned
//!   ├─ subscriber_listener(): Bus sink ─► SubscriberSet::deliver(&Event)
//!   ├─ publish RunStarting
//!   ├─ spawn Arbiter::run(mailbox)
//!   ├─ spawn Actor[0..N]::run(child token)      (JoinSet)
//!   │
//!   ├─ await arbiter verdict
//!   │     ├─ Drained   ─► join actors ─► Outcome::AllFinished
//!   │     ├─ TimedOut  ─► cancel actors, join ─► Outcome::TimedOut
//!   │     └─ Abandoned ─► join actors ─► RuntimeError::MailboxClosed
//!   │
//!   └─ stop listener: drain sink ─► SubscriberSet::shutdown() (drains queues)
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use philosophers::{Config, Coordinator, Journal, EventKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let journal = Arc::new(Journal::new());
//!     let cfg = Config::new(5, 3).with_timeout(Duration::from_secs(5));
//!     let coordinator = Coordinator::builder(cfg)
//!         .with_subscriber(journal.clone())
//!         .build();
//!
//!     let outcome = coordinator.run().await?;
//!     assert!(outcome.is_all_finished());
//!     assert_eq!(journal.count(EventKind::WorkPerformed), 15);
//!     Ok(())
//! }
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use super::ActorId;
use super::actor::{Actor, ActorReport};
use super::arbiter::{Arbiter, ArbiterPhase};
use super::builder::CoordinatorBuilder;
use super::outcome::{Outcome, Summary};
use super::table::Table;
use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Runs the arbitrated table and reports how it ended.
pub struct Coordinator {
    /// Run configuration.
    cfg: Config,
    /// Subscribers attached to every run.
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Coordinator {
    /// Returns a builder for the given configuration.
    pub fn builder(cfg: Config) -> CoordinatorBuilder {
        CoordinatorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { cfg, subscribers }
    }

    /// Configuration used by [`run`](Self::run).
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs one table until every actor finished or the arbiter timed out.
    ///
    /// ### Errors
    /// - [`RuntimeError::Config`] if the configuration is invalid; nothing is spawned
    ///   and no event is published.
    /// - [`RuntimeError::ArbiterPanicked`], [`RuntimeError::ActorPanicked`],
    ///   [`RuntimeError::ActorTaskFailed`] and [`RuntimeError::MailboxClosed`] are never
    ///   returned under normal operation.
    ///
    /// A timed-out run is `Ok(Outcome::TimedOut(_))`.
    pub async fn run(&self) -> Result<Outcome, RuntimeError> {
        self.cfg.validate()?;
        let cfg = &self.cfg;

        let (bus, sink) = Bus::with_sink(cfg.bus_capacity_clamped());
        let listener_stop = CancellationToken::new();
        let listener = self.subscriber_listener(&bus, sink, listener_stop.clone());

        tracing::info!(
            actors = cfg.actors,
            work_units = cfg.work_units,
            timeout = ?cfg.timeout,
            tie_break = cfg.tie_break.as_str(),
            "run starting"
        );
        bus.publish(
            Event::new(EventKind::RunStarting)
                .with_actor_count(cfg.actors)
                .with_remaining(cfg.work_units)
                .with_timeout(cfg.timeout),
        );

        let started = Instant::now();
        let table = Table::new(cfg.actors);
        let (arbiter, handle) = Arbiter::new(
            cfg.actors,
            cfg.timeout,
            cfg.mailbox_capacity_clamped(),
            bus.clone(),
        );
        let arbiter = tokio::spawn(arbiter.run());

        let token = CancellationToken::new();
        let mut set = JoinSet::new();
        for id in 0..table.len() {
            let actor = Actor::new(
                id,
                cfg.work_units,
                table.seat(id),
                handle.clone(),
                bus.clone(),
                cfg.tie_break,
            );
            let run = AssertUnwindSafe(actor.run(token.child_token())).catch_unwind();
            set.spawn(async move { run.await.map_err(|_| id) });
        }
        drop(handle);

        let verdict = arbiter.await;
        let elapsed = started.elapsed();
        if !matches!(&verdict, Ok(v) if v.phase == ArbiterPhase::Drained) {
            token.cancel();
        }
        let reports = Self::join_actors(&mut set, cfg.actors).await;

        drop(bus);
        listener_stop.cancel();
        let _ = listener.await;

        let verdict = verdict.map_err(|_| RuntimeError::ArbiterPanicked)?;
        let reports = reports?;
        let summary = Summary {
            actors: cfg.actors,
            work_units: cfg.work_units,
            finished: verdict.finished,
            reports,
            stats: verdict.stats,
            elapsed,
        };

        match verdict.phase {
            ArbiterPhase::Drained => {
                tracing::info!(
                    elapsed = ?summary.elapsed,
                    grants = summary.stats.grants,
                    "all actors finished"
                );
                Ok(Outcome::AllFinished(summary))
            }
            ArbiterPhase::TimedOut => {
                tracing::error!(
                    finished = summary.finished,
                    unfinished = ?summary.unfinished(),
                    "run ended by arbiter timeout"
                );
                Ok(Outcome::TimedOut(summary))
            }
            ArbiterPhase::Idle | ArbiterPhase::Running | ArbiterPhase::Abandoned => {
                Err(RuntimeError::MailboxClosed {
                    finished: summary.finished,
                    expected: summary.actors,
                })
            }
        }
    }

    /// Joins every actor; reports come back indexed by actor id.
    ///
    /// A panicking actor is reported as `Err(id)` by its task. A task that ends any
    /// other way (e.g. aborted) becomes [`RuntimeError::ActorTaskFailed`]. The first
    /// failure wins; every task is still joined.
    async fn join_actors(
        set: &mut JoinSet<Result<ActorReport, ActorId>>,
        actors: usize,
    ) -> Result<Vec<ActorReport>, RuntimeError> {
        let mut reports: Vec<Option<ActorReport>> = vec![None; actors];
        let mut failure: Option<RuntimeError> = None;

        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok(report)) => reports[report.actor] = Some(report),
                Ok(Err(actor)) => {
                    tracing::error!(actor, "actor panicked");
                    failure.get_or_insert(RuntimeError::ActorPanicked { actor });
                }
                Err(e) => {
                    tracing::error!("actor task failed: {e}");
                    failure.get_or_insert(RuntimeError::ActorTaskFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(reports.into_iter().flatten().collect()),
        }
    }

    /// Forwards every event from the bus sink to the subscriber set.
    ///
    /// After `stop` fires, drains what is still queued in the sink and shuts the set
    /// down, so every subscriber has processed every event once the task completes.
    fn subscriber_listener(
        &self,
        bus: &Bus,
        mut rx: mpsc::UnboundedReceiver<Event>,
        stop: CancellationToken,
    ) -> JoinHandle<()> {
        let set = SubscriberSet::new(self.subscribers.clone(), bus.clone());

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Some(ev) => set.deliver(&ev).await,
                        None => break,
                    },
                    _ = stop.cancelled() => {
                        while let Ok(ev) = rx.try_recv() {
                            set.deliver(&ev).await;
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        })
    }
}
