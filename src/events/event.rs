//! # Runtime events emitted by the arbiter, actors and resources.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Run events**: run and arbiter lifecycle (starting, drained, timed out)
//! - **Admission events**: arbiter decisions (grant, queue, release, violation)
//! - **Actor events**: resource leases and work performed
//! - **Subscriber events**: delivery problems inside the fan-out
//!
//! The [`Event`] struct carries the metadata: actor id, resource index, arbiter
//! counters (active slots, queue position, finished actors), remaining work, timeout
//! and a free-form reason. Each counter has its own field.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Broadcast delivery across publishers may interleave; sort by `seq` to restore the
//! exact order. Resource events take their `seq` while the lease is held, so sorting a
//! trace by `seq` reproduces the true acquire/release order of every resource.
//!
//! ## Example
//! ```rust
//! use philosophers::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::GrantIssued)
//!     .with_actor(3)
//!     .with_active(2);
//!
//! assert_eq!(ev.kind, EventKind::GrantIssued);
//! assert_eq!(ev.actor, Some(3));
//! assert_eq!(ev.active, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::ActorId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Run events ===
    /// Coordinator validated the config and is spawning the run.
    ///
    /// Sets:
    /// - `actor_count`: ring size
    /// - `remaining`: work units per actor
    /// - `timeout_ms`: arbiter idle timeout
    RunStarting,

    /// Arbiter entered its message loop.
    ArbiterStarted,

    /// Every actor reported finished; the arbiter stopped.
    ///
    /// Sets:
    /// - `finished`: finished count
    ArbiterDrained,

    /// No message reached the arbiter within its timeout.
    ///
    /// Sets:
    /// - `timeout_ms`: the idle timeout that elapsed
    /// - `finished`: finished count at that moment
    ArbiterTimedOut,

    // === Admission events ===
    /// Arbiter granted an actor a slot.
    ///
    /// Sets:
    /// - `actor`: granted actor
    /// - `active`: `|active|` after the grant
    /// - `from_queue`: whether the grant promoted a queued request
    GrantIssued,

    /// Arbiter queued a request because the cap was reached.
    ///
    /// Sets:
    /// - `actor`: queued actor
    /// - `position`: 1-based place in the queue (its length after the append)
    RequestQueued,

    /// An actor gave its slot back.
    ///
    /// Sets:
    /// - `actor`: releasing actor
    /// - `active`: `|active|` after the release (before any promotion)
    SlotReleased,

    /// An actor reported its final unit; counted towards the drain condition.
    ///
    /// Sets:
    /// - `actor`: finished actor
    /// - `finished`: finished count after this notice
    ActorFinished,

    /// Arbiter rejected a message.
    ///
    /// Sets:
    /// - `actor`: offending actor
    /// - `reason`: violation label
    ProtocolViolation,

    // === Actor events ===
    /// Actor took a lease on a resource.
    ///
    /// Sets:
    /// - `actor`, `resource`
    ResourceAcquired,

    /// Actor gave a lease back.
    ///
    /// Sets:
    /// - `actor`, `resource`
    ResourceReleased,

    /// Actor performed one unit of work while holding both resources.
    ///
    /// Sets:
    /// - `actor`
    /// - `remaining`: units left after this one
    WorkPerformed,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: `subscriber=<name> info=<panic message>`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: `subscriber=<name> reason=<full|closed>`
    SubscriberOverflow,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for log lines.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::RunStarting => "run-starting",
            EventKind::ArbiterStarted => "arbiter-started",
            EventKind::ArbiterDrained => "arbiter-drained",
            EventKind::ArbiterTimedOut => "arbiter-timed-out",
            EventKind::GrantIssued => "grant",
            EventKind::RequestQueued => "queued",
            EventKind::SlotReleased => "released",
            EventKind::ActorFinished => "finished",
            EventKind::ProtocolViolation => "protocol-violation",
            EventKind::ResourceAcquired => "acquired",
            EventKind::ResourceReleased => "dropped",
            EventKind::WorkPerformed => "work",
            EventKind::SubscriberPanicked => "subscriber-panicked",
            EventKind::SubscriberOverflow => "subscriber-overflow",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Actor the event is about.
    pub actor: Option<ActorId>,
    /// Resource index on the ring.
    pub resource: Option<usize>,
    /// `|active|` after a grant or a release.
    pub active: Option<usize>,
    /// Place of a queued request in the waiting queue (1-based).
    pub position: Option<usize>,
    /// Actors counted finished by the arbiter.
    pub finished: Option<usize>,
    /// Ring size, set on `RunStarting`.
    pub actor_count: Option<usize>,
    /// Work units left for `actor`.
    pub remaining: Option<u32>,
    /// Set on grants: `true` when the grant promoted the queue head.
    pub from_queue: Option<bool>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (violations, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            actor: None,
            resource: None,
            active: None,
            position: None,
            finished: None,
            actor_count: None,
            remaining: None,
            from_queue: None,
            timeout_ms: None,
            reason: None,
        }
    }

    /// Attaches an actor id.
    #[inline]
    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attaches a resource index.
    #[inline]
    pub fn with_resource(mut self, resource: usize) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Attaches the number of active slots.
    #[inline]
    pub fn with_active(mut self, n: usize) -> Self {
        self.active = Some(n);
        self
    }

    /// Attaches a queue position.
    #[inline]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Attaches the finished count.
    #[inline]
    pub fn with_finished(mut self, n: usize) -> Self {
        self.finished = Some(n);
        self
    }

    /// Attaches the ring size.
    #[inline]
    pub fn with_actor_count(mut self, n: usize) -> Self {
        self.actor_count = Some(n);
        self
    }

    /// Attaches the remaining work units.
    #[inline]
    pub fn with_remaining(mut self, n: u32) -> Self {
        self.remaining = Some(n);
        self
    }

    /// Marks whether a grant came from the waiting queue.
    #[inline]
    pub fn with_from_queue(mut self, from_queue: bool) -> Self {
        self.from_queue = Some(from_queue);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// Returns `true` for the two terminal arbiter events.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ArbiterDrained | EventKind::ArbiterTimedOut
        )
    }

    /// Actor id as printed for humans (1-based).
    #[inline]
    pub fn actor_number(&self) -> Option<usize> {
        self.actor.map(|a| a + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::GrantIssued);
        let b = Event::new(EventKind::SlotReleased);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_is_stored_in_millis_and_saturates() {
        let ev = Event::new(EventKind::ArbiterTimedOut).with_timeout(Duration::from_millis(1500));
        assert_eq!(ev.timeout_ms, Some(1500));

        let huge =
            Event::new(EventKind::ArbiterTimedOut).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(huge.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn terminal_kinds() {
        assert!(Event::new(EventKind::ArbiterDrained).is_terminal());
        assert!(Event::new(EventKind::ArbiterTimedOut).is_terminal());
        assert!(!Event::new(EventKind::ActorFinished).is_terminal());
    }

    #[test]
    fn admission_counters_use_their_own_fields() {
        let queued = Event::new(EventKind::RequestQueued).with_actor(1).with_position(3);
        assert_eq!(queued.position, Some(3));
        assert_eq!(queued.active, None);

        let drained = Event::new(EventKind::ArbiterDrained).with_finished(5);
        assert_eq!(drained.finished, Some(5));
        assert_eq!(drained.active, None);

        let start = Event::new(EventKind::RunStarting).with_actor_count(7);
        assert_eq!(start.actor_count, Some(7));
        assert_eq!(start.active, None);
    }

    #[test]
    fn actor_number_is_one_based() {
        let ev = Event::new(EventKind::WorkPerformed).with_actor(0);
        assert_eq!(ev.actor_number(), Some(1));
    }
}
