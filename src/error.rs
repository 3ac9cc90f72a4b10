//! Error types used by the arbiter runtime.
//!
//! This module defines three enums:
//!
//! - [`ConfigError`]: invalid run parameters, rejected before anything is spawned.
//! - [`RuntimeError`]: failures of the orchestration itself (never expected under normal inputs).
//! - [`ProtocolViolation`]: messages the arbiter refuses to act on; recovered in place.
//!
//! A timed-out run is **not** an error: it is reported as
//! [`Outcome::TimedOut`](crate::Outcome::TimedOut).
//!
//! All types provide `as_label` (stable snake_case) for logs.

use thiserror::Error;

use crate::core::ActorId;

/// # Invalid run configuration.
///
/// Returned by [`Config::validate`](crate::Config::validate) and by
/// [`Coordinator::run`](crate::Coordinator::run) before any task is started.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A ring needs at least two actors.
    #[error("at least two actors are required, got {actors}")]
    TooFewActors {
        /// Requested actor count.
        actors: usize,
    },

    /// Actor count above the configured hard limit.
    #[error("at most {max} actors are allowed, got {actors}")]
    TooManyActors {
        /// Requested actor count.
        actors: usize,
        /// Configured limit.
        max: usize,
    },

    /// Every actor must perform at least one unit of work.
    #[error("at least one work unit per actor is required, got {work_units}")]
    NoWorkUnits {
        /// Requested work units per actor.
        work_units: u32,
    },

    /// The arbiter idle timeout must be positive.
    #[error("arbiter timeout must be greater than zero")]
    ZeroTimeout,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use philosophers::ConfigError;
    ///
    /// let err = ConfigError::TooFewActors { actors: 1 };
    /// assert_eq!(err.as_label(), "config_too_few_actors");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::TooFewActors { .. } => "config_too_few_actors",
            ConfigError::TooManyActors { .. } => "config_too_many_actors",
            ConfigError::NoWorkUnits { .. } => "config_no_work_units",
            ConfigError::ZeroTimeout => "config_zero_timeout",
        }
    }
}

/// # Errors produced by the coordinator.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The run was rejected before starting.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The arbiter task panicked.
    #[error("arbiter task panicked")]
    ArbiterPanicked,

    /// An actor task panicked.
    #[error("actor {actor} panicked")]
    ActorPanicked {
        /// Id of the actor whose task panicked.
        actor: ActorId,
    },

    /// An actor task ended without a report for a reason other than a panic.
    #[error("actor task failed: {reason}")]
    ActorTaskFailed {
        /// Why the task did not complete (e.g. it was cancelled).
        reason: String,
    },

    /// Every actor handle was dropped before all actors reported finished.
    #[error("arbiter mailbox closed with {finished}/{expected} actors finished")]
    MailboxClosed {
        /// Actors that did report finished.
        finished: usize,
        /// Actors in the run.
        expected: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config(e) => e.as_label(),
            RuntimeError::ArbiterPanicked => "runtime_arbiter_panicked",
            RuntimeError::ActorPanicked { .. } => "runtime_actor_panicked",
            RuntimeError::ActorTaskFailed { .. } => "runtime_actor_task_failed",
            RuntimeError::MailboxClosed { .. } => "runtime_mailbox_closed",
        }
    }

    /// Indicates whether the error was raised before any task was started.
    pub fn is_config(&self) -> bool {
        matches!(self, RuntimeError::Config(_))
    }
}

/// # Messages the arbiter refuses.
///
/// The arbiter leaves its state untouched, logs the violation and publishes
/// [`EventKind::ProtocolViolation`](crate::EventKind::ProtocolViolation).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// Actor id outside `[0, N)`.
    #[error("unknown actor {actor}")]
    UnknownActor {
        /// Offending id.
        actor: ActorId,
    },

    /// Request from an actor that already holds a slot.
    #[error("actor {actor} requested while already active")]
    AlreadyActive {
        /// Offending id.
        actor: ActorId,
    },

    /// Request from an actor that is already waiting.
    #[error("actor {actor} requested while already queued")]
    AlreadyQueued {
        /// Offending id.
        actor: ActorId,
    },

    /// Release from an actor that holds no slot.
    #[error("actor {actor} released without holding a slot")]
    NotActive {
        /// Offending id.
        actor: ActorId,
    },

    /// Any message from an actor that already reported finished.
    #[error("actor {actor} already finished")]
    AlreadyFinished {
        /// Offending id.
        actor: ActorId,
    },

    /// Finished notice from an actor that is still waiting for a grant.
    #[error("actor {actor} finished while queued")]
    FinishedWhileQueued {
        /// Offending id.
        actor: ActorId,
    },
}

impl ProtocolViolation {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProtocolViolation::UnknownActor { .. } => "protocol_unknown_actor",
            ProtocolViolation::AlreadyActive { .. } => "protocol_already_active",
            ProtocolViolation::AlreadyQueued { .. } => "protocol_already_queued",
            ProtocolViolation::NotActive { .. } => "protocol_not_active",
            ProtocolViolation::AlreadyFinished { .. } => "protocol_already_finished",
            ProtocolViolation::FinishedWhileQueued { .. } => "protocol_finished_while_queued",
        }
    }

    /// Id of the actor that sent the rejected message.
    pub fn actor(&self) -> ActorId {
        match *self {
            ProtocolViolation::UnknownActor { actor }
            | ProtocolViolation::AlreadyActive { actor }
            | ProtocolViolation::AlreadyQueued { actor }
            | ProtocolViolation::NotActive { actor }
            | ProtocolViolation::AlreadyFinished { actor }
            | ProtocolViolation::FinishedWhileQueued { actor } => actor,
        }
    }
}
