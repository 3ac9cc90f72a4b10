//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the coordinator, the arbiter,
//! actors, and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`, with an optional lossless sink
//!
//! ## Quick reference
//! - **Publishers**: `Coordinator`, `Arbiter`, `Actor`, `Seat` (resource leases),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the coordinator's event listener, which reads the bus sink and fans
//!   out to `SubscriberSet`.
//!
//! See `core/mod.rs` for the system-level wiring diagram.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
