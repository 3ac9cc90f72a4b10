//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (arbiter, actors, coordinator).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Consumers:
//!   Actor 0  ──┐                ┌──► sink (unbounded) ──► event listener ──► SubscriberSet
//!   Actor 1  ──┼──────► Bus ────┤                          (in Coordinator)
//!   Actor N  ──┤                └──► broadcast chan ──► Bus::subscribe() receivers
//!   Arbiter  ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Lossless sink**: a bus built with [`Bus::with_sink`] hands every event to one
//!   unbounded receiver, whatever the run size. The coordinator feeds subscribers from it.
//! - **Bounded broadcast**: `subscribe()` receivers share one ring buffer; a slow receiver
//!   gets `RecvError::Lagged(n)` and skips the `n` oldest items.
//! - **No persistence**: broadcast events are lost if there are no receivers at send time.

use tokio::sync::{broadcast, mpsc};

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Broadcast is fire-and-forget**: only the sink is guaranteed to see every event.
/// - **Cloneable**: cheap to clone (internally holds `Arc`-backed senders).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
    sink: Option<mpsc::UnboundedSender<Event>>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1) and no sink.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx, sink: None }
    }

    /// Creates a bus that also forwards every event to the returned receiver.
    ///
    /// The receiver never lags: events stay queued until it reads them.
    pub fn with_sink(capacity: usize) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (sink, rx) = mpsc::unbounded_channel();
        let mut bus = Self::new(capacity);
        bus.sink = Some(sink);
        (bus, rx)
    }

    /// Publishes an event to the sink, then to all active broadcast receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        if let Some(sink) = &self.sink {
            let _ = sink.send(ev.clone());
        }
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
