//! Atom Registry
//!
//! A [`Registry`] is the provider boundary for atoms. It owns the realized
//! state of every atom queried through it, keyed by [`AtomKey`] in a side
//! table, and releases all of it when dropped.
//!
//! # Realization
//!
//! The first query for an atom realizes it:
//!
//! - **Value** and **action** atoms get a fresh signal holding a clone of
//!   the initial value. Their factory then runs once with the signal's
//!   getter and setter plus a [`Query`], and its result becomes the atom's
//!   action set for the lifetime of the registry.
//!
//! - **Computed** atoms evaluate their derivation once while recording
//!   every atom it queries. The result seeds the atom's signal, and an
//!   update routine is subscribed to each recorded source. The routine
//!   re-runs the full derivation and commits the result, which notifies
//!   downstream only if the new value is not [`Same`] as the old.
//!
//! Later queries return the realized state unchanged. Querying an atom that
//! is still being realized on the same thread fails with
//! [`AtomError::Cycle`].

use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::Mutex;

use super::definition::{Atom, AtomKey, AtomKind, Derive};
use crate::config::Config;
use crate::error::AtomError;
use crate::reactive::{ReactiveContext, Same, Signal, Source, Subscription};

type State = Arc<dyn Any + Send + Sync>;

static REGISTRY_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

struct RegistryInner {
    id: u64,
    config: Config,
    states: DashMap<AtomKey, State>,
}

/// The realized state of one atom in one registry.
struct Realized<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    signal: Signal<T>,
    actions: Arc<A>,
    /// Keeps a computed atom's update routines subscribed.
    _derivation: Option<Arc<Derivation<T>>>,
}

/// Re-evaluation state of a computed atom.
struct Derivation<T>
where
    T: Clone + Same + Send + Sync + 'static,
{
    scope: u64,
    key: AtomKey,
    label: String,
    query: Query,
    derive: Derive<T>,
    signal: Signal<T>,
    recapture: bool,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl<T> Derivation<T>
where
    T: Clone + Same + Send + Sync + 'static,
{
    /// Subscribe the update routine to `sources`, replacing any earlier
    /// subscriptions.
    fn wire(self: &Arc<Self>, sources: Vec<Arc<dyn Source>>) {
        let subscriptions: Vec<Subscription> = sources
            .iter()
            .map(|source| {
                let derivation = Arc::downgrade(self);
                source.on_change(Arc::new(move || {
                    if let Some(derivation) = derivation.upgrade() {
                        derivation.recompute();
                    }
                }))
            })
            .collect();

        tracing::trace!(atom = %self.label, sources = subscriptions.len(), "wired");
        let previous = std::mem::replace(&mut *self.subscriptions.lock(), subscriptions);
        drop(previous);
    }

    fn recompute(self: &Arc<Self>) {
        let context = ReactiveContext::recompute(self.scope, self.key.raw(), self.label.as_str(), self.recapture);
        let result = (self.derive)(&self.query);
        let sources = self.recapture.then(|| context.take_dependencies());
        drop(context);

        match result {
            Ok(value) => {
                self.signal.set(value);
                if let Some(sources) = sources {
                    self.wire(sources);
                }
            }
            Err(err) => {
                tracing::error!(atom = %self.label, error = %err, "recompute failed, keeping previous value");
            }
        }
    }
}

impl RegistryInner {
    fn lookup(&self, key: AtomKey) -> Option<State> {
        self.states.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    fn realize<T, A>(&self, query: &Query, atom: &Atom<T, A>) -> Result<State, AtomError>
    where
        T: Clone + Same + Send + Sync + 'static,
        A: Send + Sync + 'static,
    {
        let key = atom.key();
        let label = atom.to_string();

        if let Some(path) = ReactiveContext::find_cycle(self.id, key.raw(), &label) {
            return Err(AtomError::Cycle { path });
        }
        if let Some(limit) = self.config.max_realization_depth {
            if ReactiveContext::depth(self.id) >= limit {
                return Err(AtomError::DepthExceeded { limit });
            }
        }

        let realized = match atom.kind() {
            AtomKind::Value { initial, intercept: factory } | AtomKind::Action { initial, factory } => {
                let signal = Signal::new(initial.clone());
                let actions = {
                    let _context = ReactiveContext::enter(self.id, key.raw(), label.as_str(), false);
                    factory(signal.getter(), signal.setter(), query.clone())
                };
                Realized {
                    signal,
                    actions: Arc::new(actions),
                    _derivation: None,
                }
            }
            AtomKind::Computed { derive, readonly } => {
                let context = ReactiveContext::enter(self.id, key.raw(), label.as_str(), true);
                let value = derive(query)?;
                let sources = context.take_dependencies();
                drop(context);

                let signal = Signal::new(value);
                let derivation = Arc::new(Derivation {
                    scope: self.id,
                    key,
                    label: label.clone(),
                    query: query.clone(),
                    derive: Arc::clone(derive),
                    signal: signal.clone(),
                    recapture: self.config.recapture_dependencies,
                    subscriptions: Mutex::new(Vec::new()),
                });
                derivation.wire(sources);
                Realized {
                    signal,
                    actions: Arc::new(readonly()),
                    _derivation: Some(derivation),
                }
            }
        };

        tracing::debug!(registry = self.id, atom = %label, kind = atom.kind().name(), "realized");
        let state = self
            .states
            .entry(key)
            .or_insert_with(|| Arc::new(realized) as State);
        Ok(Arc::clone(state.value()))
    }
}

/// Owner of realized atom state.
///
/// Each registry is an independent world: the same atom queried through
/// two registries has two unrelated states.
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let id = REGISTRY_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(registry = id, ?config, "registry created");
        Self {
            inner: Arc::new(RegistryInner {
                id,
                config,
                states: DashMap::new(),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// A query handle bound to this registry.
    pub fn query(&self) -> Query {
        Query {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Shorthand for `self.query().get(atom)`.
    pub fn get<T, A>(&self, atom: &Atom<T, A>) -> Result<Handle<T, A>, AtomError>
    where
        T: Clone + Same + Send + Sync + 'static,
        A: Send + Sync + 'static,
    {
        self.query().get(atom)
    }

    /// Number of realized atoms.
    pub fn len(&self) -> usize {
        self.inner.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.states.is_empty()
    }

    pub fn is_realized<T, A>(&self, atom: &Atom<T, A>) -> bool
    where
        T: Clone + Same + Send + Sync + 'static,
    {
        self.inner.states.contains_key(&atom.key())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.inner.id)
            .field("realized", &self.inner.states.len())
            .finish()
    }
}

/// Resolves atoms against a registry.
///
/// A query does not keep its registry alive. Once the registry is dropped
/// every call fails with [`AtomError::ProviderDropped`].
#[derive(Clone)]
pub struct Query {
    inner: Weak<RegistryInner>,
}

impl Query {
    /// Realize `atom` if needed and return a handle to its state.
    ///
    /// Inside a computed atom's first evaluation the atom is also recorded
    /// as a dependency.
    pub fn get<T, A>(&self, atom: &Atom<T, A>) -> Result<Handle<T, A>, AtomError>
    where
        T: Clone + Same + Send + Sync + 'static,
        A: Send + Sync + 'static,
    {
        let inner = self.inner.upgrade().ok_or(AtomError::ProviderDropped)?;
        let state = match inner.lookup(atom.key()) {
            Some(state) => state,
            None => inner.realize(self, atom)?,
        };

        let realized = state.downcast::<Realized<T, A>>().map_err(|_| {
            tracing::warn!(atom = %atom, expected = type_name::<T>(), "realized state has another type");
            AtomError::TypeMismatch(atom.to_string())
        })?;

        ReactiveContext::track(Arc::new(realized.signal.clone()));
        Ok(Handle { realized })
    }

    /// The atom's current value.
    pub fn value<T, A>(&self, atom: &Atom<T, A>) -> Result<T, AtomError>
    where
        T: Clone + Same + Send + Sync + 'static,
        A: Send + Sync + 'static,
    {
        Ok(self.get(atom)?.get())
    }

    /// The atom's action set.
    pub fn actions<T, A>(&self, atom: &Atom<T, A>) -> Result<Arc<A>, AtomError>
    where
        T: Clone + Same + Send + Sync + 'static,
        A: Send + Sync + 'static,
    {
        Ok(self.get(atom)?.actions())
    }

    /// Whether the registry is still alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("alive", &self.is_alive()).finish()
    }
}

/// A realized atom: its value, its actions and its change stream.
pub struct Handle<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    realized: Arc<Realized<T, A>>,
}

impl<T, A> Handle<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    pub fn get(&self) -> T {
        self.realized.signal.get()
    }

    pub fn actions(&self) -> Arc<A> {
        Arc::clone(&self.realized.actions)
    }

    /// Call `listener` with the new value after every commit.
    pub fn listen<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.realized.signal.listen(listener)
    }

    /// The signal backing this atom.
    pub fn signal(&self) -> Signal<T> {
        self.realized.signal.clone()
    }
}

impl<T, A> Clone for Handle<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            realized: Arc::clone(&self.realized),
        }
    }
}

impl<T, A> fmt::Debug for Handle<T, A>
where
    T: Clone + Same + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("value", &self.get()).finish_non_exhaustive()
    }
}
