//! # Table: the ring of resources and each actor's seat on it.
//!
//! ```text
//!            R0
//!       A0        A4
//!    R1              R4          actor i: left = R[i], right = R[(i + 1) mod N]
//!       A1        A3
//!         R2    R3
//!            A2
//! ```
//!
//! Resources are looked up by index; a [`Seat`] keeps two shared handles, never
//! back-pointers to the actors.
//!
//! ## Acquisition
//! [`Seat::acquire`] picks the first resource by [`TieBreak`], waits for it, then
//! *tries* the second. If the second is taken, the first is released and the next
//! attempt waits on the contended resource first. No actor ever waits while holding,
//! so two actors that share both resources (N = 2) cannot wait on each other.

use std::sync::Arc;

use super::ActorId;
use super::resource::{Lease, Resource};
use crate::events::{Bus, Event, EventKind};
use crate::policies::TieBreak;

/// Ring of `N` resources.
#[derive(Debug)]
pub(crate) struct Table {
    resources: Vec<Arc<Resource>>,
}

impl Table {
    /// Creates `n` free resources.
    pub(crate) fn new(n: usize) -> Self {
        Self {
            resources: (0..n).map(|i| Arc::new(Resource::new(i))).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.resources.len()
    }

    /// Seat of `actor`: resource `actor` on the left, `(actor + 1) mod N` on the right.
    pub(crate) fn seat(&self, actor: ActorId) -> Seat {
        let n = self.resources.len();
        Seat {
            actor,
            left: Arc::clone(&self.resources[actor % n]),
            right: Arc::clone(&self.resources[(actor + 1) % n]),
        }
    }

    #[cfg(test)]
    pub(crate) fn resource(&self, index: usize) -> &Resource {
        &self.resources[index]
    }
}

/// An actor's view of its two neighbouring resources.
#[derive(Debug)]
pub(crate) struct Seat {
    actor: ActorId,
    left: Arc<Resource>,
    right: Arc<Resource>,
}

impl Seat {
    pub(crate) fn left(&self) -> usize {
        self.left.index()
    }

    pub(crate) fn right(&self) -> usize {
        self.right.index()
    }

    /// Acquires both resources, publishing one `ResourceAcquired` per lease.
    pub(crate) async fn acquire(&self, tie_break: TieBreak, bus: &Bus) -> Hold {
        let (mut first, mut second) = if tie_break.left_first() {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        loop {
            let a = first.acquire(self.actor).await;
            if let Some(b) = second.try_acquire(self.actor) {
                self.publish_acquired(bus, &a);
                self.publish_acquired(bus, &b);
                return Hold {
                    actor: self.actor,
                    first: a,
                    second: b,
                };
            }
            drop(a);
            tracing::trace!(
                actor = self.actor,
                busy = second.index(),
                "second resource busy, backing off"
            );
            std::mem::swap(&mut first, &mut second);
        }
    }

    fn publish_acquired(&self, bus: &Bus, lease: &Lease) {
        bus.publish(
            Event::new(EventKind::ResourceAcquired)
                .with_actor(self.actor)
                .with_resource(lease.resource()),
        );
    }
}

/// Both resources of one seat, held for one unit of work.
#[derive(Debug)]
pub(crate) struct Hold {
    actor: ActorId,
    first: Lease,
    second: Lease,
}

impl Hold {
    /// Resource indices in acquisition order.
    pub(crate) fn order(&self) -> [usize; 2] {
        [self.first.resource(), self.second.resource()]
    }

    /// Releases in reverse acquisition order, publishing one `ResourceReleased` per lease.
    ///
    /// Each event is created while its lease is still held, so its `seq` precedes
    /// any later acquisition of the same resource.
    pub(crate) fn release(self, bus: &Bus) {
        let Hold {
            actor,
            first,
            second,
        } = self;
        for lease in [second, first] {
            let ev = Event::new(EventKind::ResourceReleased)
                .with_actor(actor)
                .with_resource(lease.resource());
            drop(lease);
            bus.publish(ev);
        }
    }
}
