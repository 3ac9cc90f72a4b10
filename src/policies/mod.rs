//! Acquisition policies.
//!
//! ## Contents
//! - [`TieBreak`] which of its two resources an actor picks up first
//!
//! ## Quick wiring
//! ```text
//! Config { tie_break: TieBreak, .. }
//!      └─► core::actor::Actor passes it to Seat::acquire() on every grant
//! ```
//!
//! ## Defaults
//! - `TieBreak::Coin` (coin flip per grant).

mod tie_break;

pub use tie_break::TieBreak;
