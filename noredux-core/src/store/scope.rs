//! Scoped Stores
//!
//! A scoped store narrows a store over a composite state down to one of
//! its sub-states. Reads project the sub-state out of the parent; writes
//! are resolved against the current sub-state, shallow-merged onto it, and
//! committed to the parent as a single-field patch.
//!
//! A write that would not change the sub-state commits an *empty* patch
//! instead, so the parent's own change detection short-circuits and no
//! notification escapes. The completion callback still runs.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;

use super::partial::{is_same_state, FieldPatch, Lens, Partial, Update};
use crate::error::StoreError;

/// Completion callback for [`Store::set`], run after the commit.
pub type Callback = Box<dyn FnOnce() + Send>;

/// A readable, writable view of a state `S`.
pub trait Store<S: 'static>: Send + Sync {
    /// Current state.
    fn get(&self) -> Arc<S>;

    /// Commit an update and then run `callback`, if any.
    fn set(&self, update: Update<S>, callback: Option<Callback>);

    /// Commit a patch without a callback.
    fn patch(&self, partial: Partial<S>) {
        self.set(Update::Partial(partial), None);
    }
}

/// A type-erased sub-state.
pub(crate) type Part = Arc<dyn Any + Send + Sync>;

/// State assembled from named sub-states.
///
/// Built by [`combine_models`](super::combine_models). The set of names is
/// fixed at construction and every name keeps its type: the only writes a
/// composite accepts come from scoped stores replacing a sub-state with a
/// new value of the same type.
#[derive(Clone, Default)]
pub struct Composite {
    parts: IndexMap<String, Part>,
}

impl Composite {
    pub(crate) fn insert(&mut self, name: impl Into<String>, part: Part) {
        self.parts.insert(name.into(), part);
    }

    /// Fetch the sub-state stored under `name`.
    pub fn get<S>(&self, name: &str) -> Result<Arc<S>, StoreError>
    where
        S: Send + Sync + 'static,
    {
        let part = self
            .parts
            .get(name)
            .ok_or_else(|| StoreError::UnknownKey(name.to_string()))?;
        Arc::clone(part)
            .downcast::<S>()
            .map_err(|_| StoreError::TypeMismatch {
                key: name.to_string(),
                expected: type_name::<S>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Sub-state names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("parts", &self.parts.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct PartPatch {
    name: String,
    value: Part,
}

impl FieldPatch<Composite> for PartPatch {
    fn key(&self) -> &str {
        &self.name
    }

    fn matches(&self, origin: &Composite) -> bool {
        origin
            .parts
            .get(&self.name)
            .is_some_and(|current| Arc::ptr_eq(current, &self.value))
    }

    fn apply(self: Box<Self>, target: &mut Composite) {
        target.parts.insert(self.name, self.value);
    }
}

impl Partial<Composite> {
    pub(crate) fn part<S>(mut self, name: &str, value: Arc<S>) -> Self
    where
        S: Send + Sync + 'static,
    {
        self.push(Box::new(PartPatch {
            name: name.to_string(),
            value: value as Part,
        }));
        self
    }
}

/// Where a sub-state lives inside its parent.
trait Slot<P, S>: Send + Sync {
    fn name(&self) -> &str;
    fn read(&self, parent: &P) -> Arc<S>;
    fn write(&self, value: Arc<S>) -> Partial<P>;
}

impl<P, S> Slot<P, S> for Lens<P, Arc<S>>
where
    P: 'static,
    S: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        Lens::name(self)
    }

    fn read(&self, parent: &P) -> Arc<S> {
        Arc::clone(self.get(parent))
    }

    fn write(&self, value: Arc<S>) -> Partial<P> {
        Partial::new().with(*self, value)
    }
}

struct Named<S> {
    name: String,
    _state: PhantomData<fn() -> S>,
}

impl<S> Slot<Composite, S> for Named<S>
where
    S: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, parent: &Composite) -> Arc<S> {
        // Names and types are checked when the scope is bound and a
        // composite never drops or retypes a part afterwards.
        parent
            .get::<S>(&self.name)
            .unwrap_or_else(|err| panic!("scoped store lost its sub-state: {err}"))
    }

    fn write(&self, value: Arc<S>) -> Partial<Composite> {
        Partial::new().part(&self.name, value)
    }
}

/// A store restricted to one sub-state of a parent store.
pub struct ScopedStore<P: 'static, S> {
    parent: Arc<dyn Store<P>>,
    slot: Arc<dyn Slot<P, S>>,
}

impl<P: 'static, S> ScopedStore<P, S> {
    /// Name of the sub-state this store is bound to.
    pub fn name(&self) -> &str {
        self.slot.name()
    }
}

impl<P, S> Store<S> for ScopedStore<P, S>
where
    P: Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    fn get(&self) -> Arc<S> {
        self.slot.read(&self.parent.get())
    }

    fn set(&self, update: Update<S>, callback: Option<Callback>) {
        let slot = Arc::clone(&self.slot);
        let scoped = Update::reducer(move |parent: &P| {
            let origin = slot.read(parent);
            let partial = update.resolve(&origin);

            if is_same_state(&*origin, &partial) {
                tracing::trace!(scope = slot.name(), "scoped update is a no-op");
                return Partial::new();
            }
            slot.write(Arc::new(partial.apply_to(&origin)))
        });
        self.parent.set(scoped, callback);
    }
}

/// Narrow a composite store to the sub-state stored under `name`.
///
/// Fails immediately if the composite has no such name, or if it holds a
/// different type.
pub fn bind_store<S>(parent: Arc<dyn Store<Composite>>, name: &str) -> Result<Arc<dyn Store<S>>, StoreError>
where
    S: Clone + Send + Sync + 'static,
{
    parent.get().get::<S>(name)?;
    Ok(Arc::new(ScopedStore {
        parent,
        slot: Arc::new(Named::<S> {
            name: name.to_string(),
            _state: PhantomData,
        }),
    }))
}

/// Narrow a store over a struct to one of its `Arc` fields.
pub fn bind_lens<P, S>(parent: Arc<dyn Store<P>>, lens: Lens<P, Arc<S>>) -> Arc<dyn Store<S>>
where
    P: Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    Arc::new(ScopedStore {
        parent,
        slot: Arc::new(lens),
    })
}

/// Scoped stores for every sub-state of a composite store.
pub struct Scopes {
    parent: Arc<dyn Store<Composite>>,
    names: Vec<String>,
}

impl Scopes {
    /// The scoped store for `name`, typed as `S`.
    pub fn scope<S>(&self, name: &str) -> Result<Arc<dyn Store<S>>, StoreError>
    where
        S: Clone + Send + Sync + 'static,
    {
        bind_store(Arc::clone(&self.parent), name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

/// Prepare a scoped store for every name of a composite store.
pub fn map_store(parent: Arc<dyn Store<Composite>>) -> Scopes {
    let names = parent.get().names().map(str::to_string).collect();
    Scopes { parent, names }
}
