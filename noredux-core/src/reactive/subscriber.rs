//! Subscriber types for the reactive system.
//!
//! A subscriber is any callback registered on a signal: a UI binding, a
//! provider publishing its context, or a computed atom's update routine.
//! Registration hands back a [`Subscription`], which is the
//! `unsubscribe` half of the listen primitive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Unique identifier for a subscriber.
///
/// Each registered listener gets a unique ID so it can be removed again
/// without comparing closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
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

/// A listener callback for values of type `T`.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Something a subscriber can be removed from.
pub(crate) trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: SubscriberId);
}

/// Handle for a registered listener.
///
/// Dropping the handle removes the listener. Use [`detach`](Self::detach)
/// to keep the listener for as long as its source lives.
#[must_use = "dropping a Subscription removes the listener immediately"]
pub struct Subscription {
    id: SubscriberId,
    source: Option<Weak<dyn Unsubscribe>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriberId, source: Weak<dyn Unsubscribe>) -> Self {
        Self {
            id,
            source: Some(source),
        }
    }

    /// The subscriber ID this handle controls.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Give up the handle without removing the listener.
    pub fn detach(mut self) {
        self.source = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(source) = self.source.take().and_then(|weak| weak.upgrade()) {
            source.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.source.is_some())
            .finish()
    }
}
