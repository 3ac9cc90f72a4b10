//! # Result of a coordinated run.
//!
//! [`Outcome`] tells whether every actor finished or the arbiter's safety valve
//! fired; both variants carry a [`Summary`] of what happened.

use std::time::Duration;

use super::ActorId;
use super::actor::{ActorExit, ActorReport};
use super::admission::AdmissionStats;

/// Counters collected from the arbiter and the actors of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Ring size.
    pub actors: usize,
    /// Budget per actor.
    pub work_units: u32,
    /// Actors the arbiter counted as finished.
    pub finished: usize,
    /// One report per actor, indexed by actor id.
    pub reports: Vec<ActorReport>,
    /// Arbiter counters.
    pub stats: AdmissionStats,
    /// Wall time from spawn to the arbiter's terminal phase.
    pub elapsed: Duration,
}

impl Summary {
    /// Units performed across all actors.
    pub fn total_performed(&self) -> u64 {
        self.reports.iter().map(|r| u64::from(r.performed)).sum()
    }

    /// Units the run was asked to perform.
    pub fn total_expected(&self) -> u64 {
        self.actors as u64 * u64::from(self.work_units)
    }

    /// Units performed by one actor.
    pub fn performed_by(&self, actor: ActorId) -> Option<u32> {
        self.reports.get(actor).map(|r| r.performed)
    }

    /// Actors that did not finish their budget.
    pub fn unfinished(&self) -> Vec<ActorId> {
        self.reports
            .iter()
            .filter(|r| r.exit != ActorExit::Finished)
            .map(|r| r.actor)
            .collect()
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every actor performed its budget and reported finished.
    AllFinished(Summary),
    /// The arbiter received no message within its timeout.
    TimedOut(Summary),
}

impl Outcome {
    /// `true` for [`Outcome::AllFinished`].
    pub fn is_all_finished(&self) -> bool {
        matches!(self, Outcome::AllFinished(_))
    }

    /// `true` for [`Outcome::TimedOut`].
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut(_))
    }

    /// Summary of the run, whichever way it ended.
    pub fn summary(&self) -> &Summary {
        match self {
            Outcome::AllFinished(s) | Outcome::TimedOut(s) => s,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::AllFinished(_) => "all_finished",
            Outcome::TimedOut(_) => "timed_out",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actor::ActorState;

    fn report(actor: ActorId, performed: u32, exit: ActorExit) -> ActorReport {
        let state = if exit == ActorExit::Finished {
            ActorState::Finished
        } else {
            ActorState::AwaitingGrant
        };
        ActorReport {
            actor,
            performed,
            exit,
            state,
        }
    }

    #[test]
    fn totals_and_unfinished() {
        let summary = Summary {
            actors: 3,
            work_units: 2,
            finished: 2,
            reports: vec![
                report(0, 2, ActorExit::Finished),
                report(1, 1, ActorExit::Cancelled),
                report(2, 2, ActorExit::Finished),
            ],
            stats: AdmissionStats::default(),
            elapsed: Duration::ZERO,
        };
        assert_eq!(summary.total_performed(), 5);
        assert_eq!(summary.total_expected(), 6);
        assert_eq!(summary.performed_by(1), Some(1));
        assert_eq!(summary.unfinished(), vec![1]);

        let outcome = Outcome::TimedOut(summary);
        assert!(outcome.is_timed_out());
        assert_eq!(outcome.as_label(), "timed_out");
        assert_eq!(outcome.summary().finished, 2);
    }
}
