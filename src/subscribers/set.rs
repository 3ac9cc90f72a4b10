//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which distributes events to multiple subscribers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Per-subscriber FIFO**: each subscriber sees events in the order they were emitted
//! - **Overflow**: `emit()` drops the event for that subscriber only and publishes
//!   `SubscriberOverflow`
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Lossless**: `deliver()` waits for queue space instead of dropping
//! - **Isolation**: slow/panicking subscriber doesn't affect others
//!
//! ## Panic handling
//! Worker tasks use `catch_unwind` to isolate panics: the panic becomes a
//! `SubscriberPanicked` event and the worker moves on to the next event.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
///
/// - **Concurrent delivery**: events sent to all subscribers simultaneously
/// - **Isolation**: each subscriber has dedicated queue and worker
/// - **Panic safety**: panics caught and reported, don't crash runtime
/// - **Overflow handling**: dropped events reported via `SubscriberOverflow`
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let bus_for_worker = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        let info = panic_message(&*panic_err);
                        tracing::warn!(subscriber = name, %info, "subscriber panicked");
                        bus_for_worker.publish(Event::subscriber_panicked(name, info));
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` if the set has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits an event to all subscribers (clones the event once).
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a pre-allocated `Arc<Event>` to all subscribers.
    ///
    /// - Uses `try_send` (non-blocking)
    /// - On queue full or closed: drops the event for that subscriber and publishes
    ///   `SubscriberOverflow`, unless the event itself is an overflow report.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow_evt {
                tracing::warn!(subscriber = channel.name, reason, seq = event.seq, "event dropped");
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Delivers an event to all subscribers, waiting while a queue is full.
    ///
    /// Nothing is dropped for a live subscriber. A subscriber whose worker is gone is
    /// reported with `SubscriberOverflow` (reason `"closed"`).
    pub async fn deliver(&self, event: &Event) {
        let event = Arc::new(event.clone());
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            if channel.sender.send(Arc::clone(&event)).await.is_err() && !is_overflow_evt {
                tracing::warn!(subscriber = channel.name, seq = event.seq, "subscriber gone");
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, "closed"));
            }
        }
    }

    /// Gracefully shuts down all subscriber workers.
    ///
    /// 1. Drops all channel senders (workers see the channel closed after draining it)
    /// 2. Awaits all worker tasks to finish
    pub async fn shutdown(self) {
        drop(self.channels);

        for h in self.workers {
            let _ = h.await;
        }
    }
}

fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<u64>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.seq);
        }
        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Boom;

    #[async_trait]
    impl Subscribe for Boom {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "boom"
        }
    }

    #[tokio::test]
    async fn shutdown_drains_queued_events_in_order() {
        let bus = Bus::new(16);
        let collect = Arc::new(Collect::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![collect.clone()];
        let set = SubscriberSet::new(subs, bus);

        let events: Vec<Event> = (0..5).map(|_| Event::new(EventKind::WorkPerformed)).collect();
        for ev in &events {
            set.emit(ev);
        }
        set.shutdown().await;

        let seen = collect.0.lock().unwrap().clone();
        let expected: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn panicking_subscriber_is_reported_and_isolated() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let collect = Arc::new(Collect::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Boom), collect.clone()];
        let set = SubscriberSet::new(subs, bus);

        set.emit(&Event::new(EventKind::ArbiterStarted));
        set.shutdown().await;

        assert_eq!(collect.0.lock().unwrap().len(), 1);
        let ev = rx.recv().await.expect("panic report");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert!(ev.reason.as_deref().unwrap_or_default().contains("boom"));
    }

    struct Slow(Collect);

    #[async_trait]
    impl Subscribe for Slow {
        async fn on_event(&self, ev: &Event) {
            tokio::task::yield_now().await;
            self.0.on_event(ev).await;
        }
        fn name(&self) -> &'static str {
            "slow"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn deliver_waits_instead_of_dropping() {
        let (bus, mut sink) = Bus::with_sink(16);
        let slow = Arc::new(Slow(Collect::default()));
        let subs: Vec<Arc<dyn Subscribe>> = vec![slow.clone()];
        let set = SubscriberSet::new(subs, bus);

        let events: Vec<Event> = (0..50).map(|_| Event::new(EventKind::WorkPerformed)).collect();
        for ev in &events {
            set.deliver(ev).await;
        }
        set.shutdown().await;

        let seen = slow.0.0.lock().unwrap().clone();
        let expected: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(seen, expected);
        assert!(sink.try_recv().is_err(), "no overflow expected");
    }
}
