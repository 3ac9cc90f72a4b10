//! # Admission state: the arbiter's decision table.
//!
//! Pure, synchronous state machine behind the [`Arbiter`](super::arbiter::Arbiter).
//! It holds **who is active**, **who is waiting** (strict FIFO) and **who has
//! finished**, and decides every request, release and finished notice. It never
//! blocks and never touches a resource.
//!
//! Each queued entry carries an opaque reply handle `R` (a oneshot sender in the
//! arbiter, `()` in tests) that travels with the decision.
//!
//! ## Transitions
//! ```text
//! request(a)   a idle, |active| < cap  ─► active += a           ─► Granted
//!              a idle, |active| = cap  ─► queue.push_back(a)    ─► Queued
//! release(a)   a active                ─► active -= a; promote queue head (if any)
//! finish(a)    a idle or active        ─► finished += a; if active: release(a)
//! ```
//!
//! ## Invariants
//! - `|active| <= cap`
//! - no id both active and queued; no id twice in the queue
//! - an actor is counted finished at most once
//! - rejected messages leave the state untouched

use std::collections::VecDeque;

use super::ActorId;
use crate::error::ProtocolViolation;

/// Per-actor position in the admission protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Standing {
    /// Not holding a slot, not waiting.
    Idle,
    /// Holding one of the `cap` slots.
    Active,
    /// Waiting in the FIFO queue.
    Queued,
    /// Reported its last unit; no further messages accepted.
    Finished,
}

/// Decision for a request.
#[derive(Debug)]
pub(crate) enum Admission<R> {
    /// Slot granted immediately; the reply goes back to the requester.
    Granted(R),
    /// Appended to the waiting queue at `position` (1-based).
    Queued { position: usize },
}

/// Queue head promoted into a freed slot; the caller must deliver the grant.
#[derive(Debug)]
pub(crate) struct Promotion<R> {
    pub actor: ActorId,
    pub reply: R,
}

/// Counters kept across the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdmissionStats {
    /// Grants issued (immediate and promoted).
    pub grants: u64,
    /// Requests that had to wait in the queue.
    pub queued: u64,
    /// Peak `|active|`.
    pub max_active: usize,
    /// Peak queue length.
    pub max_queue: usize,
    /// Messages rejected as protocol violations.
    pub violations: u64,
}

/// Admission state of one run.
#[derive(Debug)]
pub(crate) struct AdmissionState<R> {
    cap: usize,
    standing: Vec<Standing>,
    active: usize,
    queue: VecDeque<(ActorId, R)>,
    finished: usize,
    stats: AdmissionStats,
}

impl<R> AdmissionState<R> {
    /// Creates the state for `actors` actors sharing `cap` slots.
    pub(crate) fn new(actors: usize, cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            standing: vec![Standing::Idle; actors],
            active: 0,
            queue: VecDeque::new(),
            finished: 0,
            stats: AdmissionStats::default(),
        }
    }

    /// Decides a request from `actor`.
    pub(crate) fn request(
        &mut self,
        actor: ActorId,
        reply: R,
    ) -> Result<Admission<R>, ProtocolViolation> {
        match self.standing_of(actor)? {
            Standing::Idle => {}
            Standing::Active => return self.reject(ProtocolViolation::AlreadyActive { actor }),
            Standing::Queued => return self.reject(ProtocolViolation::AlreadyQueued { actor }),
            Standing::Finished => return self.reject(ProtocolViolation::AlreadyFinished { actor }),
        }

        if self.active < self.cap {
            self.activate(actor);
            return Ok(Admission::Granted(reply));
        }

        self.standing[actor] = Standing::Queued;
        self.queue.push_back((actor, reply));
        self.stats.queued += 1;
        self.stats.max_queue = self.stats.max_queue.max(self.queue.len());
        Ok(Admission::Queued {
            position: self.queue.len(),
        })
    }

    /// Frees the slot held by `actor` and promotes the queue head, if any.
    pub(crate) fn release(
        &mut self,
        actor: ActorId,
    ) -> Result<Option<Promotion<R>>, ProtocolViolation> {
        match self.standing_of(actor)? {
            Standing::Active => {}
            Standing::Finished => return self.reject(ProtocolViolation::AlreadyFinished { actor }),
            Standing::Idle | Standing::Queued => {
                return self.reject(ProtocolViolation::NotActive { actor });
            }
        }
        self.standing[actor] = Standing::Idle;
        self.active -= 1;
        Ok(self.promote())
    }

    /// Records that `actor` performed its last unit.
    ///
    /// An actor still recorded active gives its slot back first.
    pub(crate) fn finish(
        &mut self,
        actor: ActorId,
    ) -> Result<Option<Promotion<R>>, ProtocolViolation> {
        let promoted = match self.standing_of(actor)? {
            Standing::Idle => None,
            Standing::Active => {
                self.active -= 1;
                self.promote()
            }
            Standing::Queued => {
                return self.reject(ProtocolViolation::FinishedWhileQueued { actor });
            }
            Standing::Finished => return self.reject(ProtocolViolation::AlreadyFinished { actor }),
        };
        self.standing[actor] = Standing::Finished;
        self.finished += 1;
        Ok(promoted)
    }

    /// `true` once every actor has finished.
    pub(crate) fn is_drained(&self) -> bool {
        self.finished == self.standing.len()
    }

    pub(crate) fn active_len(&self) -> usize {
        self.active
    }

    pub(crate) fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn finished(&self) -> usize {
        self.finished
    }

    pub(crate) fn stats(&self) -> AdmissionStats {
        self.stats
    }

    #[cfg(test)]
    pub(crate) fn standing(&self, actor: ActorId) -> Standing {
        self.standing[actor]
    }

    fn standing_of(&mut self, actor: ActorId) -> Result<Standing, ProtocolViolation> {
        match self.standing.get(actor).copied() {
            Some(s) => Ok(s),
            None => self.reject(ProtocolViolation::UnknownActor { actor }),
        }
    }

    fn reject<T>(&mut self, violation: ProtocolViolation) -> Result<T, ProtocolViolation> {
        self.stats.violations += 1;
        Err(violation)
    }

    fn activate(&mut self, actor: ActorId) {
        debug_assert!(self.active < self.cap);
        self.standing[actor] = Standing::Active;
        self.active += 1;
        self.stats.grants += 1;
        self.stats.max_active = self.stats.max_active.max(self.active);
    }

    fn promote(&mut self) -> Option<Promotion<R>> {
        let (actor, reply) = self.queue.pop_front()?;
        self.activate(actor);
        Some(Promotion { actor, reply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(a: Result<Admission<()>, ProtocolViolation>) -> bool {
        matches!(a, Ok(Admission::Granted(())))
    }

    #[test]
    fn grants_up_to_cap_then_queues() {
        let mut st = AdmissionState::new(5, 2);
        assert!(granted(st.request(0, ())));
        assert!(granted(st.request(2, ())));
        assert!(matches!(st.request(1, ()), Ok(Admission::Queued { position: 1 })));
        assert!(matches!(st.request(3, ()), Ok(Admission::Queued { position: 2 })));

        assert_eq!(st.active_len(), 2);
        assert_eq!(st.queue_len(), 2);
        assert_eq!(st.standing(1), Standing::Queued);
    }

    #[test]
    fn release_promotes_queue_head_in_fifo_order() {
        let mut st = AdmissionState::new(5, 2);
        st.request(0, ()).unwrap();
        st.request(1, ()).unwrap();
        st.request(4, ()).unwrap();
        st.request(2, ()).unwrap();
        st.request(3, ()).unwrap();

        let p = st.release(0).unwrap().expect("promotion");
        assert_eq!(p.actor, 4);
        let p = st.release(1).unwrap().expect("promotion");
        assert_eq!(p.actor, 2);
        let p = st.release(4).unwrap().expect("promotion");
        assert_eq!(p.actor, 3);
        assert!(st.release(2).unwrap().is_none());

        assert_eq!(st.active_len(), 1);
        assert_eq!(st.standing(0), Standing::Idle);
        assert_eq!(st.standing(3), Standing::Active);
    }

    #[test]
    fn active_never_exceeds_cap() {
        let mut st = AdmissionState::new(8, 2);
        for a in 0..8 {
            st.request(a, ()).unwrap();
            assert!(st.active_len() <= 2);
        }
        for a in 0..8 {
            if st.standing(a) == Standing::Active {
                st.release(a).unwrap();
                assert!(st.active_len() <= 2);
            }
        }
        assert_eq!(st.stats().max_active, 2);
    }

    #[test]
    fn duplicate_and_out_of_turn_messages_are_rejected() {
        let mut st = AdmissionState::new(3, 2);
        st.request(0, ()).unwrap();
        st.request(1, ()).unwrap();
        st.request(2, ()).unwrap();

        assert!(matches!(
            st.request(0, ()),
            Err(ProtocolViolation::AlreadyActive { actor: 0 })
        ));
        assert!(matches!(
            st.request(2, ()),
            Err(ProtocolViolation::AlreadyQueued { actor: 2 })
        ));
        assert!(matches!(
            st.release(2),
            Err(ProtocolViolation::NotActive { actor: 2 })
        ));
        assert!(matches!(
            st.finish(2),
            Err(ProtocolViolation::FinishedWhileQueued { actor: 2 })
        ));
        assert!(matches!(
            st.request(9, ()),
            Err(ProtocolViolation::UnknownActor { actor: 9 })
        ));

        assert_eq!(st.stats().violations, 5);
        assert_eq!(st.active_len(), 2);
        assert_eq!(st.queue_len(), 1);
    }

    #[test]
    fn finish_counts_once_and_drains() {
        let mut st = AdmissionState::new(2, 2);
        assert!(st.finish(0).unwrap().is_none());
        assert!(matches!(
            st.finish(0),
            Err(ProtocolViolation::AlreadyFinished { actor: 0 })
        ));
        assert!(matches!(
            st.request(0, ()),
            Err(ProtocolViolation::AlreadyFinished { actor: 0 })
        ));
        assert!(!st.is_drained());

        st.finish(1).unwrap();
        assert!(st.is_drained());
        assert_eq!(st.finished(), 2);
    }

    #[test]
    fn finish_while_active_frees_the_slot() {
        let mut st = AdmissionState::new(3, 2);
        st.request(0, ()).unwrap();
        st.request(1, ()).unwrap();
        st.request(2, ()).unwrap();

        let p = st.finish(0).unwrap().expect("promotion");
        assert_eq!(p.actor, 2);
        assert_eq!(st.active_len(), 2);
        assert_eq!(st.standing(0), Standing::Finished);
    }

    #[test]
    fn stats_track_grants_and_queue_peak() {
        let mut st = AdmissionState::new(4, 2);
        for a in 0..4 {
            st.request(a, ()).unwrap();
        }
        st.release(0).unwrap();
        st.release(1).unwrap();

        let stats = st.stats();
        assert_eq!(stats.grants, 4);
        assert_eq!(stats.queued, 2);
        assert_eq!(stats.max_queue, 2);
        assert_eq!(stats.max_active, 2);
    }
}
