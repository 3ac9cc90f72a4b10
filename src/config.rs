//! # Run configuration.
//!
//! Provides [`Config`], the centralized settings for one arbitrated run.
//!
//! Config is used in two ways:
//! 1. **Coordinator creation**: `Coordinator::builder(config).build()`
//! 2. **Validation**: [`Config::validate`] runs before any task is spawned.
//!
//! ## Sentinel values
//! - `mailbox_capacity = 0` → sized to the actor count
//! - `bus_capacity` is clamped to a minimum of 1

use std::time::Duration;

use crate::error::ConfigError;
use crate::policies::TieBreak;

/// Default upper bound on `actors`.
pub const DEFAULT_MAX_ACTORS: usize = 8000;

/// Configuration for one arbitrated run.
///
/// ## Field semantics
/// - `actors`: ring size N (`>= 2`, `<= max_actors`)
/// - `work_units`: units each actor performs before finishing (`>= 1`)
/// - `timeout`: longest the arbiter waits for its next message (`> 0`)
/// - `max_actors`: hard limit on `actors`
/// - `tie_break`: order in which an actor picks up its two resources
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `mailbox_capacity`: arbiter inbound queue size (`0` = `actors`)
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of actors seated around the ring.
    pub actors: usize,

    /// Work units per actor.
    pub work_units: u32,

    /// Arbiter idle timeout.
    ///
    /// The interval restarts after every message. Under correct operation it
    /// never fires; when it does the run ends with `Outcome::TimedOut`.
    pub timeout: Duration,

    /// Upper bound accepted for `actors`.
    pub max_actors: usize,

    /// Resource pick-up order policy.
    pub tie_break: TieBreak,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Only `Bus::subscribe` receivers are bounded by it: one lagging by more than
    /// `bus_capacity` events skips the oldest ones. Subscribers attached to a
    /// coordinator are fed losslessly whatever its value.
    pub bus_capacity: usize,

    /// Capacity of the arbiter mailbox.
    ///
    /// Senders wait while it is full; the arbiter never blocks while consuming it.
    pub mailbox_capacity: usize,
}

impl Config {
    /// Creates a config with the given ring size and work budget, other fields default.
    pub fn new(actors: usize, work_units: u32) -> Self {
        Self {
            actors,
            work_units,
            ..Self::default()
        }
    }

    /// Sets the arbiter idle timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the resource pick-up order policy.
    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Checks the run parameters.
    ///
    /// Order of checks: actor count, actor limit, work units, timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actors < 2 {
            return Err(ConfigError::TooFewActors {
                actors: self.actors,
            });
        }
        if self.actors > self.max_actors {
            return Err(ConfigError::TooManyActors {
                actors: self.actors,
                max: self.max_actors,
            });
        }
        if self.work_units == 0 {
            return Err(ConfigError::NoWorkUnits {
                work_units: self.work_units,
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Total units the run must perform (`actors * work_units`).
    #[inline]
    pub fn total_work_units(&self) -> u64 {
        self.actors as u64 * u64::from(self.work_units)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the mailbox capacity, resolving the `0` sentinel to the actor count.
    #[inline]
    pub fn mailbox_capacity_clamped(&self) -> usize {
        match self.mailbox_capacity {
            0 => self.actors.max(1),
            n => n,
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `actors = 5`, `work_units = 3` (the classic table)
    /// - `timeout = 10s`
    /// - `max_actors = 8000`
    /// - `tie_break = TieBreak::Coin`
    /// - `bus_capacity = 1024`
    /// - `mailbox_capacity = 0` (one slot per actor)
    fn default() -> Self {
        Self {
            actors: 5,
            work_units: 3,
            timeout: Duration::from_secs(10),
            max_actors: DEFAULT_MAX_ACTORS,
            tie_break: TieBreak::default(),
            bus_capacity: 1024,
            mailbox_capacity: 0,
        }
    }
}
