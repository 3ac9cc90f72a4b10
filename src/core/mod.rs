//! Runtime core: admission, resources and orchestration.
//!
//! The only entry point from this module is [`Coordinator`], which runs one table
//! of actors under a single arbiter and returns an [`Outcome`].
//!
//! Internal modules:
//! - [`resource`]: exclusive resources and the leases that hold them;
//! - [`table`]: ring layout, seats and deadlock-free two-resource pickup;
//! - [`admission`]: pure admission state (cap, FIFO queue, finished set);
//! - [`arbiter`]: mailbox loop driving the admission state, with idle timeout;
//! - [`actor`]: one philosopher's request/work/release loop;
//! - [`coordinator`]: spawns everything, joins it, drains subscribers.
//!
//! ```text
//!              ┌────────── mailbox (mpsc) ──────────┐
//!  Actor 0 ────┤ Request / Release / Finished       ├──► Arbiter (AdmissionState)
//!  Actor 1 ────┤                                    │        │
//!  Actor N-1 ──┘                                    │        └─► Grant (oneshot per request)
//!     │                                             │
//!     └──► Seat(left, right) ──► Resource[i] (tokio Mutex, owned lease)
//! ```

mod actor;
mod admission;
mod arbiter;
mod builder;
mod coordinator;
mod outcome;
mod resource;
mod table;

/// Actor identifier: position in the ring, `0..N`.
pub type ActorId = usize;

pub use actor::{ActorExit, ActorReport, ActorState};
pub use admission::AdmissionStats;
pub use arbiter::{ArbiterPhase, MAX_ACTIVE};
pub use builder::CoordinatorBuilder;
pub use coordinator::Coordinator;
pub use outcome::{Outcome, Summary};
