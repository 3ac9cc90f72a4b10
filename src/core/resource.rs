//! # Resource: one exclusive token shared by two neighbours.
//!
//! A [`Resource`] wraps a `tokio::sync::Mutex` whose content records the current
//! holder. Taking the lock yields a [`Lease`]; dropping the lease clears the holder
//! and unlocks, waking one waiter.
//!
//! ## Rules
//! - At most one actor holds a resource at any instant (the mutex guarantees it).
//! - `acquire` cannot fail, only wait.
//! - `try_acquire` never waits.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::ActorId;

/// Exclusive resource on the ring.
#[derive(Debug)]
pub(crate) struct Resource {
    index: usize,
    holder: Arc<Mutex<Option<ActorId>>>,
}

impl Resource {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            holder: Arc::new(Mutex::new(None)),
        }
    }

    /// Position on the ring.
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Waits until the resource is free, then leases it to `actor`.
    pub(crate) async fn acquire(&self, actor: ActorId) -> Lease {
        let guard = Arc::clone(&self.holder).lock_owned().await;
        Lease::new(self.index, actor, guard)
    }

    /// Leases the resource to `actor` only if it is free right now.
    pub(crate) fn try_acquire(&self, actor: ActorId) -> Option<Lease> {
        let guard = Arc::clone(&self.holder).try_lock_owned().ok()?;
        Some(Lease::new(self.index, actor, guard))
    }

    /// Returns `true` if nobody holds the resource at this instant.
    #[cfg(test)]
    pub(crate) fn is_free(&self) -> bool {
        self.holder.try_lock().is_ok()
    }
}

/// Held lease on a [`Resource`]; releases on drop.
#[derive(Debug)]
pub(crate) struct Lease {
    resource: usize,
    guard: OwnedMutexGuard<Option<ActorId>>,
}

impl Lease {
    fn new(resource: usize, actor: ActorId, mut guard: OwnedMutexGuard<Option<ActorId>>) -> Self {
        debug_assert!(guard.is_none(), "resource {resource} leased while held");
        *guard = Some(actor);
        Self { resource, guard }
    }

    /// Index of the leased resource.
    pub(crate) fn resource(&self) -> usize {
        self.resource
    }

    /// Actor holding the lease.
    #[cfg(test)]
    pub(crate) fn holder(&self) -> Option<ActorId> {
        *self.guard
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        *self.guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn lease_marks_holder_and_frees_on_drop() {
        let r = Resource::new(0);
        assert!(r.is_free());

        let lease = r.acquire(7).await;
        assert_eq!(lease.holder(), Some(7));
        assert_eq!(lease.resource(), 0);
        assert!(!r.is_free());
        assert!(r.try_acquire(8).is_none());

        drop(lease);
        assert!(r.is_free());
        let again = r.try_acquire(8).expect("free after release");
        assert_eq!(again.holder(), Some(8));
    }

    #[tokio::test]
    async fn waiter_is_woken_by_release() {
        let r = Arc::new(Resource::new(1));
        let first = r.acquire(0).await;

        let r2 = Arc::clone(&r);
        let waiter = tokio::spawn(async move { r2.acquire(1).await.holder() });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        assert_eq!(waiter.await.expect("join"), Some(1));
    }
}
