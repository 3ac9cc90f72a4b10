//! # Arbiter: the single authority that admits actors.
//!
//! The arbiter owns an [`AdmissionState`] and consumes one mailbox. Because only
//! this task reads the mailbox and mutates the state, every decision is atomic with
//! respect to the global order in which messages arrive; no lock guards the state.
//!
//! ## Protocol
//! ```text
//! Actor ── Request{actor, reply} ──► Arbiter ── Grant ──► reply (now or on promotion)
//! Actor ── Release{actor}        ──► Arbiter ── Grant ──► queue head (if any)
//! Actor ── Finished{actor}       ──► Arbiter ── finished += 1; drained?
//! ```
//!
//! ## Phases
//! ```text
//! Idle ──run()──► Running ──finished == N──► Drained
//!                    └────no message within timeout──► TimedOut
//!                    └────all handles dropped─────────► Abandoned
//! ```
//!
//! ## Rules
//! - At most [`MAX_ACTIVE`] actors hold a grant at once, whatever N is.
//! - Waiting requests are granted strictly in arrival order.
//! - The timeout restarts after every message.
//! - A grant whose requester is gone frees its slot again and promotes the next head.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time;

use super::ActorId;
use super::admission::{Admission, AdmissionState, AdmissionStats, Promotion};
use crate::error::ProtocolViolation;
use crate::events::{Bus, Event, EventKind};

/// Concurrency cap: actors allowed to hold both resources at the same time.
pub const MAX_ACTIVE: usize = 2;

/// Inbound arbiter message.
#[derive(Debug)]
pub(crate) enum Message {
    /// Ask for a slot; answered on `reply` once granted.
    Request {
        actor: ActorId,
        reply: oneshot::Sender<Grant>,
    },
    /// Give the slot back after one unit of work.
    Release { actor: ActorId },
    /// Last unit done; the actor will send nothing else.
    Finished { actor: ActorId },
}

/// Permission to acquire both resources for one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Grant {
    /// `|active|` right after this grant.
    pub active: usize,
}

/// The arbiter stopped before the message could be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArbiterGone;

/// Arbiter lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterPhase {
    /// Constructed, loop not started.
    Idle,
    /// Processing messages.
    Running,
    /// Every actor reported finished.
    Drained,
    /// No message arrived within the timeout.
    TimedOut,
    /// Every handle was dropped before the run drained.
    Abandoned,
}

/// How an arbiter run ended, with its final counters.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Verdict {
    pub phase: ArbiterPhase,
    pub finished: usize,
    pub stats: AdmissionStats,
}

/// Handle for talking to the arbiter.
#[derive(Clone, Debug)]
pub(crate) struct ArbiterHandle {
    tx: mpsc::Sender<Message>,
}

impl ArbiterHandle {
    /// Requests a slot and waits until it is granted.
    pub(crate) async fn request(&self, actor: ActorId) -> Result<Grant, ArbiterGone> {
        let (reply, rx) = oneshot::channel();
        self.send(Message::Request { actor, reply }).await?;
        rx.await.map_err(|_| ArbiterGone)
    }

    /// Gives the slot back.
    pub(crate) async fn release(&self, actor: ActorId) -> Result<(), ArbiterGone> {
        self.send(Message::Release { actor }).await
    }

    /// Reports that `actor` is done for good.
    pub(crate) async fn finished(&self, actor: ActorId) -> Result<(), ArbiterGone> {
        self.send(Message::Finished { actor }).await
    }

    async fn send(&self, msg: Message) -> Result<(), ArbiterGone> {
        self.tx.send(msg).await.map_err(|_| ArbiterGone)
    }
}

/// Mailbox consumer deciding admission for one run.
pub(crate) struct Arbiter {
    state: AdmissionState<oneshot::Sender<Grant>>,
    mailbox: mpsc::Receiver<Message>,
    bus: Bus,
    timeout: Duration,
    phase: ArbiterPhase,
}

impl Arbiter {
    /// Creates an idle arbiter for `actors` actors and the handle to reach it.
    pub(crate) fn new(
        actors: usize,
        timeout: Duration,
        mailbox_capacity: usize,
        bus: Bus,
    ) -> (Self, ArbiterHandle) {
        let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
        let arbiter = Self {
            state: AdmissionState::new(actors, MAX_ACTIVE),
            mailbox: rx,
            bus,
            timeout,
            phase: ArbiterPhase::Idle,
        };
        (arbiter, ArbiterHandle { tx })
    }

    /// Runs the message loop until drained, timed out or abandoned.
    pub(crate) async fn run(mut self) -> Verdict {
        self.phase = ArbiterPhase::Running;
        self.bus.publish(Event::new(EventKind::ArbiterStarted));

        self.phase = loop {
            let msg = match time::timeout(self.timeout, self.mailbox.recv()).await {
                Ok(Some(msg)) => msg,
                Ok(None) => break ArbiterPhase::Abandoned,
                Err(_elapsed) => {
                    self.on_timeout();
                    break ArbiterPhase::TimedOut;
                }
            };

            self.handle(msg);

            if self.state.is_drained() {
                tracing::debug!(finished = self.state.finished(), "arbiter drained");
                self.bus.publish(
                    Event::new(EventKind::ArbiterDrained).with_finished(self.state.finished()),
                );
                break ArbiterPhase::Drained;
            }
        };

        Verdict {
            phase: self.phase,
            finished: self.state.finished(),
            stats: self.state.stats(),
        }
    }

    fn handle(&mut self, msg: Message) {
        match msg {
            Message::Request { actor, reply } => match self.state.request(actor, reply) {
                Ok(Admission::Granted(reply)) => self.grant(actor, reply, false),
                Ok(Admission::Queued { position }) => {
                    tracing::debug!(actor, position, "request queued");
                    self.bus.publish(
                        Event::new(EventKind::RequestQueued)
                            .with_actor(actor)
                            .with_position(position),
                    );
                }
                Err(v) => self.on_violation(v),
            },
            Message::Release { actor } => match self.state.release(actor) {
                Ok(promoted) => {
                    let after = self.state.active_len() - usize::from(promoted.is_some());
                    self.bus.publish(
                        Event::new(EventKind::SlotReleased)
                            .with_actor(actor)
                            .with_active(after),
                    );
                    if let Some(p) = promoted {
                        self.grant(p.actor, p.reply, true);
                    }
                }
                Err(v) => self.on_violation(v),
            },
            Message::Finished { actor } => match self.state.finish(actor) {
                Ok(promoted) => {
                    let finished = self.state.finished();
                    tracing::debug!(actor, finished, "actor finished");
                    self.bus.publish(
                        Event::new(EventKind::ActorFinished)
                            .with_actor(actor)
                            .with_finished(finished),
                    );
                    if let Some(p) = promoted {
                        self.grant(p.actor, p.reply, true);
                    }
                }
                Err(v) => self.on_violation(v),
            },
        }
    }

    /// Delivers a grant; if the requester is gone, frees the slot and tries the next head.
    fn grant(
        &mut self,
        mut actor: ActorId,
        mut reply: oneshot::Sender<Grant>,
        mut from_queue: bool,
    ) {
        loop {
            let active = self.state.active_len();
            let ev = Event::new(EventKind::GrantIssued)
                .with_actor(actor)
                .with_active(active)
                .with_from_queue(from_queue);

            if reply.send(Grant { active }).is_ok() {
                tracing::debug!(actor, active, from_queue, "grant issued");
                self.bus.publish(ev);
                return;
            }

            tracing::debug!(actor, "grant undeliverable, freeing slot");
            match self.state.release(actor) {
                Ok(Some(Promotion {
                    actor: next,
                    reply: next_reply,
                })) => {
                    actor = next;
                    reply = next_reply;
                    from_queue = true;
                }
                Ok(None) => return,
                Err(v) => {
                    self.on_violation(v);
                    return;
                }
            }
        }
    }

    fn on_violation(&self, v: ProtocolViolation) {
        tracing::warn!(actor = v.actor(), violation = v.as_label(), "{v}");
        self.bus.publish(
            Event::new(EventKind::ProtocolViolation)
                .with_actor(v.actor())
                .with_reason(v.as_label()),
        );
    }

    fn on_timeout(&self) {
        tracing::error!(
            timeout = ?self.timeout,
            finished = self.state.finished(),
            active = self.state.active_len(),
            queued = self.state.queue_len(),
            "arbiter received no message within its timeout; a message was likely lost"
        );
        self.bus.publish(
            Event::new(EventKind::ArbiterTimedOut)
                .with_timeout(self.timeout)
                .with_finished(self.state.finished()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(
        actors: usize,
        timeout: Duration,
    ) -> (tokio::task::JoinHandle<Verdict>, ArbiterHandle, Bus) {
        let bus = Bus::new(256);
        let (arbiter, handle) = Arbiter::new(actors, timeout, actors, bus.clone());
        (tokio::spawn(arbiter.run()), handle, bus)
    }

    #[tokio::test]
    async fn two_actors_are_granted_immediately_and_drain() {
        let (join, h, _bus) = spawn(2, Duration::from_secs(5));

        assert_eq!(h.request(0).await, Ok(Grant { active: 1 }));
        assert_eq!(h.request(1).await, Ok(Grant { active: 2 }));
        h.release(0).await.unwrap();
        h.release(1).await.unwrap();
        h.finished(0).await.unwrap();
        h.finished(1).await.unwrap();

        let verdict = join.await.unwrap();
        assert_eq!(verdict.phase, ArbiterPhase::Drained);
        assert_eq!(verdict.finished, 2);
        assert_eq!(verdict.stats.queued, 0);
        assert_eq!(verdict.stats.max_active, 2);
    }

    #[tokio::test]
    async fn third_request_waits_for_a_release() {
        let (_join, h, _bus) = spawn(5, Duration::from_secs(5));
        h.request(0).await.unwrap();
        h.request(1).await.unwrap();

        let h2 = h.clone();
        let waiting = tokio::spawn(async move { h2.request(2).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        h.release(0).await.unwrap();
        let grant = waiting.await.unwrap().unwrap();
        assert_eq!(grant.active, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_times_out() {
        let (join, h, bus) = spawn(2, Duration::from_millis(50));
        let mut rx = bus.subscribe();
        h.request(0).await.unwrap();

        let verdict = join.await.unwrap();
        assert_eq!(verdict.phase, ArbiterPhase::TimedOut);
        assert_eq!(verdict.finished, 0);

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::ArbiterTimedOut));
        assert!(h.release(0).await.is_err(), "mailbox must be closed after timeout");
    }

    #[tokio::test]
    async fn dropping_every_handle_abandons() {
        let (join, h, _bus) = spawn(3, Duration::from_secs(5));
        h.finished(0).await.unwrap();
        drop(h);

        let verdict = join.await.unwrap();
        assert_eq!(verdict.phase, ArbiterPhase::Abandoned);
        assert_eq!(verdict.finished, 1);
    }

    #[tokio::test]
    async fn undeliverable_grant_frees_its_slot() {
        let (_join, h, _bus) = spawn(4, Duration::from_secs(5));
        h.request(0).await.unwrap();
        h.request(1).await.unwrap();

        // Actor 2 queues, then goes away before being promoted.
        let (reply, rx) = oneshot::channel();
        h.tx.send(Message::Request { actor: 2, reply }).await.unwrap();
        drop(rx);

        let h3 = h.clone();
        let waiting = tokio::spawn(async move { h3.request(3).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        h.release(0).await.unwrap();
        let grant = waiting.await.unwrap().unwrap();
        assert_eq!(grant.active, 2);
    }

    #[tokio::test]
    async fn violations_are_published_and_ignored() {
        let (_join, h, bus) = spawn(2, Duration::from_secs(5));
        let mut rx = bus.subscribe();

        h.release(1).await.unwrap();
        h.request(0).await.unwrap();

        let mut violation = None;
        while violation.is_none() {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::ProtocolViolation {
                violation = Some(ev);
            }
        }
        let ev = violation.unwrap();
        assert_eq!(ev.actor, Some(1));
        assert_eq!(ev.reason.as_deref(), Some("protocol_not_active"));
    }
}
