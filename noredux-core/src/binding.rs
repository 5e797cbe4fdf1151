//! Component Bindings
//!
//! A [`Binding`] stands in for the host framework's "use external state"
//! hook. Mounting copies the source's current snapshot into local render
//! state and subscribes once; every notification replaces the local copy
//! and counts as one re-render. Dropping the binding unmounts it.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::atom::Handle;
use crate::reactive::{Listener, Same, Signal, Subscription};
use crate::store::{Context, Provider};

/// A value a binding can mount on.
pub trait Observable<T> {
    /// The value as of now.
    fn snapshot(&self) -> T;

    /// Call `listener` with every new value.
    fn observe(&self, listener: Listener<T>) -> Subscription;
}

impl<T> Observable<T> for Signal<T>
where
    T: Clone + Same + Send + Sync + 'static,
{
    fn snapshot(&self) -> T {
        self.get()
    }

    fn observe(&self, listener: Listener<T>) -> Subscription {
        self.listen(move |value| listener(value))
    }
}

impl<T, A> Observable<T> for Handle<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    fn snapshot(&self) -> T {
        self.get()
    }

    fn observe(&self, listener: Listener<T>) -> Subscription {
        self.listen(move |value| listener(value))
    }
}

impl<S, A> Observable<Arc<Context<S, A>>> for Provider<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    fn snapshot(&self) -> Arc<Context<S, A>> {
        self.context()
    }

    fn observe(&self, listener: Listener<Arc<Context<S, A>>>) -> Subscription {
        self.listen(move |context| listener(context))
    }
}

/// Local render state kept in sync with an [`Observable`].
pub struct Binding<T> {
    state: Arc<RwLock<T>>,
    renders: Arc<AtomicUsize>,
    _subscription: Subscription,
}

impl<T> Binding<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Snapshot `source` and subscribe to it.
    pub fn mount<O>(source: &O) -> Self
    where
        O: Observable<T> + ?Sized,
    {
        let state = Arc::new(RwLock::new(source.snapshot()));
        let renders = Arc::new(AtomicUsize::new(0));

        let sink = Arc::clone(&state);
        let counter = Arc::clone(&renders);
        let subscription = source.observe(Arc::new(move |value: &T| {
            *sink.write() = value.clone();
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        Self {
            state,
            renders,
            _subscription: subscription,
        }
    }

    /// The value as of the last render.
    pub fn current(&self) -> T {
        self.state.read().clone()
    }

    /// Number of re-renders since mount.
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Unsubscribe and drop the local state.
    pub fn unmount(self) {}
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("current", &*self.state.read())
            .field("renders", &self.renders.load(Ordering::SeqCst))
            .finish()
    }
}
