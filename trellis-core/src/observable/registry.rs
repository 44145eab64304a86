//! Subscription registry and notification protocol.
//!
//! The registry holds the ordered list of active subscribers for one
//! container and runs the two-pass notification cycle:
//!
//! 1. **Invalidation pass**: every subscriber's `invalidate` callback
//!    runs, in subscription order.
//! 2. **Handler pass**: every subscriber's `handler` callback runs, in
//!    subscription order, with the container in its new state.
//!
//! All invalidations complete before any handler runs. This lets a
//! subscriber pair invalidation ("about to change") with handling
//! ("has changed"), e.g. to drop a stale cache before recomputing.
//!
//! Membership for a cycle is frozen when the cycle starts: the entry
//! list is snapshotted and the lock released before any callback runs.
//! A subscriber added or removed during a cycle takes effect from the
//! next cycle onward. The lock is never held across user callbacks, so
//! a handler that mutates the container starts a nested cycle instead
//! of deadlocking; that re-entrant behavior is deliberately unguarded.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::trace;

/// Unique identifier for a subscriber.
///
/// Uses an atomic counter to ensure uniqueness across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered observer: an `invalidate` callback and a `handler`
/// callback, stored in subscription order.
pub(crate) struct Subscriber<C> {
    id: SubscriberId,
    handler: Box<dyn Fn(&C) + Send + Sync>,
    invalidate: Box<dyn Fn() + Send + Sync>,
}

impl<C> Subscriber<C> {
    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn invalidate(&self) {
        (self.invalidate)()
    }

    pub(crate) fn handle(&self, container: &C) {
        (self.handler)(container)
    }
}

type Entries<C> = Arc<RwLock<SmallVec<[Arc<Subscriber<C>>; 4]>>>;

/// Ordered list of active subscribers for one container.
///
/// # Type Parameters
///
/// - `C`: the container type passed to handler callbacks.
pub struct SubscriptionRegistry<C> {
    entries: Entries<C>,
}

impl<C> SubscriptionRegistry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(SmallVec::new())),
        }
    }

    /// Get the number of active subscribers.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check whether the registry has no active subscribers.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Run one notification cycle against `container`.
    ///
    /// Snapshots the subscriber list, then runs the invalidation pass
    /// followed by the handler pass over that snapshot. A panic in a
    /// callback unwinds out of the cycle and skips the remaining
    /// subscribers in that pass; subscribers are not isolated from
    /// each other's failures.
    pub fn notify(&self, container: &C) {
        let cycle: SmallVec<[Arc<Subscriber<C>>; 4]> = self.entries.read().clone();
        trace!(subscribers = cycle.len(), "notification cycle");

        for subscriber in &cycle {
            subscriber.invalidate();
        }
        for subscriber in &cycle {
            subscriber.handle(container);
        }
    }
}

impl<C: 'static> SubscriptionRegistry<C> {
    /// Register a subscriber.
    ///
    /// Returns the new entry (so the caller can deliver the initial
    /// synchronous handler invocation) and the [`Subscription`] that
    /// removes it.
    pub(crate) fn add(
        &self,
        handler: Box<dyn Fn(&C) + Send + Sync>,
        invalidate: Box<dyn Fn() + Send + Sync>,
    ) -> (Arc<Subscriber<C>>, Subscription) {
        let subscriber = Arc::new(Subscriber {
            id: SubscriberId::new(),
            handler,
            invalidate,
        });
        self.entries.write().push(Arc::clone(&subscriber));

        let entries = Arc::clone(&self.entries);
        let id = subscriber.id;
        let subscription = Subscription {
            cancel: Box::new(move || {
                entries.write().retain(|entry| entry.id() != id);
            }),
        };

        (subscriber, subscription)
    }
}

impl<C> Default for SubscriptionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for SubscriptionRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}

/// Handle that removes one subscriber from its registry.
///
/// Calling [`unsubscribe`](Subscription::unsubscribe) more than once is
/// safe; only the first call has any effect. Dropping the handle does
/// *not* unsubscribe: the subscriber stays active for the life of the
/// container.
pub struct Subscription {
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl Subscription {
    /// Remove the subscriber this handle was created for.
    pub fn unsubscribe(&self) {
        (self.cancel)()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription")
    }
}
