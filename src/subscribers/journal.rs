//! # Journal – in-memory record of a run
//!
//! Keeps every event it receives, so a finished run can be inspected after
//! [`Coordinator::run`](crate::Coordinator::run) returns.
//!
//! ## Behavior
//! - Events are stored as delivered; [`Journal::snapshot`] returns them sorted by `seq`,
//!   which is the true global order (see [`Event`]).
//! - The journal is append-only; [`Journal::clear`] resets it between runs.
//!
//! ## Internal scheme
//! ```text
//! on_event(ev):  push(ev.clone())
//!
//! snapshot() -> Vec<Event>          (sorted by seq)
//! of_kind(kind) -> Vec<Event>       (sorted by seq, filtered)
//! count(kind) -> usize
//! ```

use std::sync::RwLock;

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Records events for later inspection.
pub struct Journal {
    inner: RwLock<Vec<Event>>,
    capacity: usize,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
            capacity: 65_536,
        }
    }

    /// Configure the queue capacity for this subscriber.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Returns all recorded events in `seq` order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Event> {
        let mut v = self.inner.read().unwrap().clone();
        v.sort_unstable_by_key(|e| e.seq);
        v
    }

    /// Returns recorded events of one kind in `seq` order.
    #[must_use]
    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        let mut v: Vec<Event> = self
            .inner
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect();
        v.sort_unstable_by_key(|e| e.seq);
        v
    }

    /// Number of recorded events of one kind.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.inner
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every recorded event.
    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }
}

#[async_trait]
impl Subscribe for Journal {
    async fn on_event(&self, ev: &Event) {
        self.inner.write().unwrap().push(ev.clone());
    }

    fn name(&self) -> &'static str {
        "Journal"
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}
