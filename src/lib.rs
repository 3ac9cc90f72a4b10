//! # philosophers
//!
//! **philosophers** runs the dining philosophers problem under a single central
//! arbiter. N actors sit around a ring of N exclusive resources; each actor needs
//! both neighbouring resources for every unit of work. The arbiter caps how many
//! actors may hold a grant at once and hands waiting actors their turn strictly in
//! arrival order.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌──────────┐   ┌──────────┐         ┌──────────┐
//!   │ Actor 0  │   │ Actor 1  │   ...   │ Actor N-1│
//!   └──┬───┬───┘   └──┬───┬───┘         └──┬───┬───┘
//!      │   │ Request / Release / Finished  │   │
//!      │   └──────────────┬────────────────┘   │
//!      │                  ▼                    │
//!      │      ┌────────────────────────┐       │
//!      │      │ Arbiter (one task)     │       │
//!      │      │ - AdmissionState       │       │
//!      │      │   cap = MAX_ACTIVE (2) │       │
//!      │      │   FIFO waiting queue   │       │
//!      │      │ - idle timeout         │       │
//!      │      └───────────┬────────────┘       │
//!      │                  │ Grant (oneshot)    │
//!      ▼                  ▼                    ▼
//!   Resource[i] = left of actor i, right of actor i-1 (mod N)
//!
//!   every component ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                               ├─► LogWriter
//!                                                               └─► Journal / custom
//! ```
//!
//! ### Lifecycle of one actor
//! ```text
//! while remaining > 0 {
//!   ├─► Request ──► wait for Grant       (queued if two actors are active)
//!   ├─► pick up both resources           (TieBreak order, back off on contention)
//!   ├─► perform one unit, remaining -= 1
//!   ├─► put both resources down          (reverse order)
//!   └─► Release ──► arbiter promotes the queue head, if any
//! }
//! Finished ──► arbiter counts it; when all N have finished the run is drained
//! ```
//!
//! ## Guarantees
//! - No resource is ever held by two actors at once.
//! - At most [`MAX_ACTIVE`] actors hold a grant at any moment.
//! - Queued requests are granted in the order they were queued.
//! - Every actor performs exactly its budget of work when the run completes.
//! - A run in which the arbiter hears nothing for `Config::timeout` ends with
//!   [`Outcome::TimedOut`] instead of hanging.
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] and builds the
//!   `philosophers` binary.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), philosophers::RuntimeError> {
//!     let outcome = philosophers::run(5, 3, Duration::from_secs(10)).await?;
//!     assert!(outcome.is_all_finished());
//!     assert_eq!(outcome.summary().total_performed(), 15);
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;

use std::time::Duration;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_MAX_ACTORS};
pub use crate::core::{
    ActorExit, ActorId, ActorReport, ActorState, AdmissionStats, ArbiterPhase, Coordinator,
    CoordinatorBuilder, MAX_ACTIVE, Outcome, Summary,
};
pub use error::{ConfigError, ProtocolViolation, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use policies::TieBreak;
pub use subscribers::{Journal, Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

/// Runs `actors` actors with `work_units` units each and the given arbiter timeout.
///
/// Shorthand for building a [`Coordinator`] from [`Config::new`] with no subscribers.
/// Invalid parameters return [`RuntimeError::Config`] before anything is spawned.
pub async fn run(
    actors: usize,
    work_units: u32,
    timeout: Duration,
) -> Result<Outcome, RuntimeError> {
    let cfg = Config::new(actors, work_units).with_timeout(timeout);
    Coordinator::builder(cfg).build().run().await
}
