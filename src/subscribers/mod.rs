//! # Event subscribers for the arbiter runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations for handling runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Arbiter / Actor ── publish(Event) ──► Bus sink ──► listener ──► SubscriberSet::deliver
//!                                                                        │
//!                                                            ┌───────────┼───────────┐
//!                                                            ▼           ▼           ▼
//!                                                        LogWriter    Journal     Custom ...
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** - observe and react to events (logging, alerts)
//! - **Stateful subscribers** - keep state built from events ([`Journal`])

mod journal;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod embedded;

pub use journal::Journal;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
