//! Signal Implementation
//!
//! A Signal is the minimal unit of reactive state: a value, a change path
//! and a listener registry. Atoms, providers and computed values are all
//! built on top of it.
//!
//! # How Signals Work
//!
//! 1. `update` resolves the reducer against the *current* value, so
//!    sequential calls always observe each other's effects.
//!
//! 2. The result is compared with the stored value using [`Same`]. An
//!    identical result is a no-op and notifies nobody.
//!
//! 3. Otherwise the value is stored and every listener registered at that
//!    moment is called once, synchronously, with the new value.
//!
//! There is no batching and no queue: each call produces at most one
//! notification pass.
//!
//! # Concurrency
//!
//! Every write call holds the signal's reentrant write lock from the read
//! through the notification pass. Writers on other threads wait their turn,
//! so a reducer always sees the value the previous call committed.
//!
//! The value lock itself is never held while user code runs. Reducers work
//! on a snapshot and listeners iterate a snapshot of the registry, so on
//! the writing thread a reducer or listener may call `set` on any signal
//! (including this one) or drop its own subscription mid-pass. Listeners
//! added during a pass are not called for that pass.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{ReentrantMutex, RwLock};
use smallvec::SmallVec;

use super::equality::Same;
use super::subscriber::{Listener, SubscriberId, Subscription, Unsubscribe};

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The listener registry of one signal.
struct ListenerSet<T> {
    signal_id: u64,
    entries: RwLock<IndexMap<SubscriberId, Listener<T>>>,
}

impl<T: 'static> ListenerSet<T> {
    fn notify(&self, value: &T) {
        let snapshot: SmallVec<[Listener<T>; 4]> = self.entries.read().values().cloned().collect();
        tracing::trace!(signal = self.signal_id, listeners = snapshot.len(), "notify");
        for listener in snapshot {
            listener(value);
        }
    }
}

impl<T: 'static> Unsubscribe for ListenerSet<T>
where
    T: Send + Sync,
{
    fn unsubscribe(&self, id: SubscriberId) {
        self.entries.write().shift_remove(&id);
    }
}

/// A reactive cell holding a value of type T.
///
/// Cloning a signal yields another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use noredux_core::reactive::Signal;
///
/// let count = Signal::new(1);
/// let _sub = count.listen(|v| println!("count is now {v}"));
///
/// count.update(|v| v + 1); // prints "count is now 2"
/// count.set(2);            // same value: nothing happens
/// ```
pub struct Signal<T>
where
    T: Clone + Same + Send + Sync + 'static,
{
    /// Unique identifier for this signal.
    id: u64,

    /// The current value.
    value: Arc<RwLock<T>>,

    /// Serializes write calls, from the read to the end of notification.
    writer: Arc<ReentrantMutex<()>>,

    /// Registered listeners, in registration order.
    listeners: Arc<ListenerSet<T>>,
}

impl<T> Signal<T>
where
    T: Clone + Same + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        let id = next_signal_id();
        Self {
            id,
            value: Arc::new(RwLock::new(value)),
            writer: Arc::new(ReentrantMutex::new(())),
            listeners: Arc::new(ListenerSet {
                signal_id: id,
                entries: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get a snapshot of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// The cell is read-locked while `f` runs, so `f` must not write to
    /// this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Replace the value. Returns whether anything was committed.
    pub fn set(&self, value: T) -> bool {
        let _writer = self.writer.lock();
        self.commit(value)
    }

    /// Compute the next value from the current one and commit it.
    ///
    /// A panic inside `f` propagates to the caller and nothing is stored.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let _writer = self.writer.lock();
        let current = self.get();
        self.commit(f(&current))
    }

    /// Like [`update`](Self::update), for reducers that can fail.
    ///
    /// An `Err` is returned to the caller untouched and the value is left
    /// as it was.
    pub fn try_update<F, E>(&self, f: F) -> Result<bool, E>
    where
        F: FnOnce(&T) -> Result<T, E>,
    {
        let _writer = self.writer.lock();
        let current = self.get();
        let next = f(&current)?;
        Ok(self.commit(next))
    }

    fn commit(&self, next: T) -> bool {
        {
            let mut guard = self.value.write();
            if guard.same(&next) {
                return false;
            }
            *guard = next.clone();
        }
        tracing::trace!(signal = self.id, "commit");
        self.listeners.notify(&next);
        true
    }

    /// Register a listener, called with the new value after every commit.
    pub fn listen<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        self.listeners
            .entries
            .write()
            .insert(id, Arc::new(listener));

        let weak = Arc::downgrade(&self.listeners);
        Subscription::new(id, weak)
    }

    /// Get the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.entries.read().len()
    }

    /// Read-only handle to this signal.
    pub fn getter(&self) -> Getter<T> {
        Getter(self.clone())
    }

    /// Write handle to this signal.
    pub fn setter(&self) -> Setter<T> {
        Setter(self.clone())
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Same + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            writer: Arc::clone(&self.writer),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Same + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &*self.value.read())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

/// The `get` half handed to action factories.
pub struct Getter<T>(Signal<T>)
where
    T: Clone + Same + Send + Sync + 'static;

impl<T> Getter<T>
where
    T: Clone + Same + Send + Sync + 'static,
{
    pub fn get(&self) -> T {
        self.0.get()
    }
}

impl<T> Clone for Getter<T>
where
    T: Clone + Same + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// The `set` half handed to action factories, and the default action set
/// of a plain value atom.
pub struct Setter<T>(Signal<T>)
where
    T: Clone + Same + Send + Sync + 'static;

impl<T> Setter<T>
where
    T: Clone + Same + Send + Sync + 'static,
{
    pub fn set(&self, value: T) -> bool {
        self.0.set(value)
    }

    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        self.0.update(f)
    }

    pub fn try_update<F, E>(&self, f: F) -> Result<bool, E>
    where
        F: FnOnce(&T) -> Result<T, E>,
    {
        self.0.try_update(f)
    }
}

impl<T> Clone for Setter<T>
where
    T: Clone + Same + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
