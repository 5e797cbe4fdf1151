//! Atom Definitions
//!
//! An atom is an immutable description of a piece of state. It carries no
//! live value itself; each [`Registry`](super::Registry) realizes it on
//! first query and keeps the realized state in its own side table.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::registry::Query;
use crate::error::AtomError;
use crate::reactive::{Getter, Same, Setter};

/// Process-unique identity of an atom. Clones of an atom share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomKey(u64);

impl AtomKey {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw key value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AtomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "atom#{}", self.0)
    }
}

/// Builds the action set of a value or action atom.
pub type Factory<T, A> = Arc<dyn Fn(Getter<T>, Setter<T>, Query) -> A + Send + Sync>;

/// Derivation function of a computed atom.
pub type Derive<T> = Arc<dyn Fn(&Query) -> Result<T, AtomError> + Send + Sync>;

/// What an atom is, and so how it gets realized.
pub enum AtomKind<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    /// A plain value. `intercept` receives the primitive setter and returns
    /// the actions readers get; by default that is the setter itself.
    Value { initial: T, intercept: Factory<T, A> },

    /// A value with a custom action set. The factory may query other atoms.
    Action { initial: T, factory: Factory<T, A> },

    /// A read-only value derived from other atoms.
    Computed { derive: Derive<T>, readonly: fn() -> A },
}

impl<T, A> AtomKind<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    pub fn name(&self) -> &'static str {
        match self {
            AtomKind::Value { .. } => "value",
            AtomKind::Action { .. } => "action",
            AtomKind::Computed { .. } => "computed",
        }
    }
}

/// A typed atom: state `T`, actions `A`.
///
/// ```rust
/// use noredux_core::atom::{Atom, Registry};
///
/// let count = Atom::value(1).named("count");
/// let doubled = {
///     let count = count.clone();
///     Atom::computed(move |query| Ok(query.value(&count)? * 2))
/// };
///
/// let registry = Registry::new();
/// let query = registry.query();
/// assert_eq!(query.value(&doubled).unwrap(), 2);
///
/// query.actions(&count).unwrap().set(5);
/// assert_eq!(query.value(&doubled).unwrap(), 10);
/// ```
pub struct Atom<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    key: AtomKey,
    label: Option<Arc<str>>,
    kind: Arc<AtomKind<T, A>>,
}

impl<T> Atom<T, Setter<T>>
where
    T: Clone + Same + Send + Sync + 'static,
{
    /// An atom holding `initial`, whose actions are its setter.
    pub fn value(initial: T) -> Self {
        Self::from_kind(AtomKind::Value {
            initial,
            intercept: Arc::new(|_get: Getter<T>, set: Setter<T>, _query: Query| set),
        })
    }
}

impl<T, A> Atom<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    /// A value atom whose setter is replaced by `proxy`'s result.
    pub fn proxied<F>(initial: T, proxy: F) -> Self
    where
        F: Fn(Getter<T>, Setter<T>, Query) -> A + Send + Sync + 'static,
    {
        Self::from_kind(AtomKind::Value {
            initial,
            intercept: Arc::new(proxy),
        })
    }

    /// An atom holding `initial` with actions built by `factory`.
    pub fn action<F>(initial: T, factory: F) -> Self
    where
        F: Fn(Getter<T>, Setter<T>, Query) -> A + Send + Sync + 'static,
    {
        Self::from_kind(AtomKind::Action {
            initial,
            factory: Arc::new(factory),
        })
    }
}

impl<T> Atom<T, ()>
where
    T: Clone + Same + Send + Sync + 'static,
{
    /// A read-only atom derived from the atoms `derive` queries.
    ///
    /// Dependencies are captured on the first evaluation only, unless the
    /// registry is configured to recapture. An atom read only on some
    /// branches of `derive` is tracked only if the first evaluation took
    /// that branch.
    pub fn computed<F>(derive: F) -> Self
    where
        F: Fn(&Query) -> Result<T, AtomError> + Send + Sync + 'static,
    {
        Self::from_kind(AtomKind::Computed {
            derive: Arc::new(derive),
            readonly: || (),
        })
    }
}

impl<T, A> Atom<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    fn from_kind(kind: AtomKind<T, A>) -> Self {
        Self {
            key: AtomKey::next(),
            label: None,
            kind: Arc::new(kind),
        }
    }

    /// Attach a label used in logs and cycle reports.
    pub fn named(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn key(&self) -> AtomKey {
        self.key
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn kind(&self) -> &AtomKind<T, A> {
        &self.kind
    }
}

impl<T, A> Clone for Atom<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            label: self.label.clone(),
            kind: Arc::clone(&self.kind),
        }
    }
}

impl<T, A> fmt::Display for Atom<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => f.write_str(label),
            None => fmt::Display::fmt(&self.key, f),
        }
    }
}

impl<T, A> fmt::Debug for Atom<T, A>
where
    T: Clone + Same + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("kind", &self.kind.name())
            .finish()
    }
}
