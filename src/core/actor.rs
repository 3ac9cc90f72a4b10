//! # Actor: one philosopher working through its budget.
//!
//! Each actor loops until its work budget is spent:
//! - asks the arbiter for a slot,
//! - picks up both neighbouring resources,
//! - performs one unit of work,
//! - puts the resources down and gives the slot back.
//!
//! ## Event flow
//! For each unit, the actor (and its seat) publishes:
//! ```text
//! ResourceAcquired ×2 → WorkPerformed → ResourceReleased ×2
//! ```
//! Grants, releases and the final notice are published by the arbiter.
//!
//! ## Architecture
//! ```text
//! Coordinator ──► Actor::run()
//!
//! while remaining > 0 {
//!   ├─► arbiter.request(id)     (AwaitingGrant; cancellable)
//!   ├─► seat.acquire(tie_break) (cancellable)
//!   ├─► remaining -= 1, publish WorkPerformed   (Holding)
//!   ├─► hold.release()          (reverse order)
//!   └─► arbiter.release(id)
//! }
//! arbiter.finished(id)          (Finished)
//! ```
//!
//! ## Rules
//! - Units run **sequentially** within one actor.
//! - Cancellation is observed only at the two suspension points (grant, resources).
//! - An actor never holds a resource while waiting for a grant.

use tokio::select;
use tokio_util::sync::CancellationToken;

use super::ActorId;
use super::arbiter::ArbiterHandle;
use super::table::Seat;
use crate::events::{Bus, Event, EventKind};
use crate::policies::TieBreak;

/// Lifecycle state of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Created, not yet running.
    Idle,
    /// Request sent, waiting for the arbiter.
    AwaitingGrant,
    /// Granted and holding (or picking up) both resources.
    Holding,
    /// Budget spent and the arbiter notified.
    Finished,
}

/// Why an actor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorExit {
    /// Performed every unit and notified the arbiter.
    Finished,
    /// The run was cancelled (after an arbiter timeout).
    Cancelled,
    /// The arbiter stopped answering.
    ArbiterGone,
}

/// What an actor reports back to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorReport {
    /// Actor id.
    pub actor: ActorId,
    /// Units of work performed.
    pub performed: u32,
    /// Exit reason.
    pub exit: ActorExit,
    /// State at exit.
    pub state: ActorState,
}

/// One philosopher.
pub(crate) struct Actor {
    id: ActorId,
    remaining: u32,
    seat: Seat,
    arbiter: ArbiterHandle,
    bus: Bus,
    tie_break: TieBreak,
    state: ActorState,
    performed: u32,
}

impl Actor {
    pub(crate) fn new(
        id: ActorId,
        work_units: u32,
        seat: Seat,
        arbiter: ArbiterHandle,
        bus: Bus,
        tie_break: TieBreak,
    ) -> Self {
        Self {
            id,
            remaining: work_units,
            seat,
            arbiter,
            bus,
            tie_break,
            state: ActorState::Idle,
            performed: 0,
        }
    }

    /// Runs until the budget is spent, the run is cancelled, or the arbiter is gone.
    pub(crate) async fn run(mut self, token: CancellationToken) -> ActorReport {
        tracing::trace!(
            actor = self.id,
            left = self.seat.left(),
            right = self.seat.right(),
            budget = self.remaining,
            "actor seated"
        );

        while self.remaining > 0 {
            self.state = ActorState::AwaitingGrant;
            let grant = select! {
                res = self.arbiter.request(self.id) => res,
                _ = token.cancelled() => return self.exit(ActorExit::Cancelled),
            };
            if grant.is_err() {
                return self.exit(ActorExit::ArbiterGone);
            }

            self.state = ActorState::Holding;
            let hold = select! {
                hold = self.seat.acquire(self.tie_break, &self.bus) => hold,
                _ = token.cancelled() => return self.exit(ActorExit::Cancelled),
            };

            self.remaining -= 1;
            self.performed += 1;
            tracing::trace!(
                actor = self.id,
                order = ?hold.order(),
                remaining = self.remaining,
                "work performed"
            );
            self.bus.publish(
                Event::new(EventKind::WorkPerformed)
                    .with_actor(self.id)
                    .with_remaining(self.remaining),
            );

            hold.release(&self.bus);

            if self.arbiter.release(self.id).await.is_err() {
                return self.exit(ActorExit::ArbiterGone);
            }
        }

        if self.arbiter.finished(self.id).await.is_err() {
            return self.exit(ActorExit::ArbiterGone);
        }
        self.state = ActorState::Finished;
        self.exit(ActorExit::Finished)
    }

    fn exit(&self, exit: ActorExit) -> ActorReport {
        if exit != ActorExit::Finished {
            tracing::debug!(
                actor = self.id,
                ?exit,
                performed = self.performed,
                "actor stopped early"
            );
        }
        ActorReport {
            actor: self.id,
            performed: self.performed,
            exit,
            state: self.state,
        }
    }
}
