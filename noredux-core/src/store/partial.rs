//! Partial Updates
//!
//! Stores are written with shallow patches rather than whole values. A
//! [`Partial<S>`] lists the fields to overwrite, each addressed through a
//! [`Lens`]. Applying a partial clones the current state and overwrites
//! only those fields; nested values are replaced wholesale, never merged.

use std::fmt;

use smallvec::SmallVec;

use crate::reactive::Same;

/// A named field accessor for `S`.
///
/// Build one with [`lens!`](crate::lens).
pub struct Lens<S, V> {
    name: &'static str,
    get: fn(&S) -> &V,
    get_mut: fn(&mut S) -> &mut V,
}

impl<S, V> Lens<S, V> {
    pub fn new(name: &'static str, get: fn(&S) -> &V, get_mut: fn(&mut S) -> &mut V) -> Self {
        Self { name, get, get_mut }
    }

    /// The field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get<'a>(&self, state: &'a S) -> &'a V {
        (self.get)(state)
    }

    pub fn get_mut<'a>(&self, state: &'a mut S) -> &'a mut V {
        (self.get_mut)(state)
    }
}

impl<S, V> Clone for Lens<S, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, V> Copy for Lens<S, V> {}

impl<S, V> fmt::Debug for Lens<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lens").field(&self.name).finish()
    }
}

/// Build a [`Lens`] for a named struct field.
///
/// ```rust
/// use noredux_core::lens;
///
/// #[derive(Clone)]
/// struct User { name: String, age: u32 }
///
/// let age = lens!(User, age);
/// let user = User { name: "x".into(), age: 3 };
/// assert_eq!(*age.get(&user), 3);
/// assert_eq!(age.name(), "age");
/// ```
#[macro_export]
macro_rules! lens {
    ($ty:ty, $field:ident) => {
        $crate::store::Lens::<$ty, _>::new(
            stringify!($field),
            |s: &$ty| &s.$field,
            |s: &mut $ty| &mut s.$field,
        )
    };
}

/// One field of a partial update.
pub(crate) trait FieldPatch<S>: Send {
    fn key(&self) -> &str;

    /// True when `origin` already holds this field's value.
    fn matches(&self, origin: &S) -> bool;

    fn apply(self: Box<Self>, target: &mut S);
}

struct LensPatch<S, V> {
    lens: Lens<S, V>,
    value: V,
}

impl<S, V> FieldPatch<S> for LensPatch<S, V>
where
    V: Same + Send,
{
    fn key(&self) -> &str {
        self.lens.name()
    }

    fn matches(&self, origin: &S) -> bool {
        self.lens.get(origin).same(&self.value)
    }

    fn apply(self: Box<Self>, target: &mut S) {
        let LensPatch { lens, value } = *self;
        *lens.get_mut(target) = value;
    }
}

/// A shallow patch for `S`.
pub struct Partial<S> {
    fields: SmallVec<[Box<dyn FieldPatch<S>>; 4]>,
}

impl<S: 'static> Partial<S> {
    /// An empty patch. Committing it never changes anything.
    pub fn new() -> Self {
        Self {
            fields: SmallVec::new(),
        }
    }

    /// Set the field behind `lens` to `value`.
    ///
    /// Setting the same field twice keeps the last value.
    pub fn with<V>(mut self, lens: Lens<S, V>, value: V) -> Self
    where
        V: Same + Send + 'static,
    {
        self.push(Box::new(LensPatch { lens, value }));
        self
    }

    pub(crate) fn push(&mut self, field: Box<dyn FieldPatch<S>>) {
        self.fields.retain(|f| f.key() != field.key());
        self.fields.push(field);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Names of the patched fields, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.key())
    }

    /// True when every patched field already holds its value in `origin`.
    pub fn matches(&self, origin: &S) -> bool {
        self.fields.iter().all(|f| f.matches(origin))
    }

    /// Apply the patch in place.
    pub fn apply(self, target: &mut S) {
        for field in self.fields {
            field.apply(target);
        }
    }

    /// Clone `origin` and apply the patch to the copy.
    pub fn apply_to(self, origin: &S) -> S
    where
        S: Clone,
    {
        let mut next = origin.clone();
        self.apply(&mut next);
        next
    }
}

impl<S: 'static> Default for Partial<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> fmt::Debug for Partial<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

/// Shallow comparison of a patch against a state.
///
/// True when the patch is empty or every field it sets already holds an
/// identical value in `origin`. A field that `origin` does not have counts
/// as a difference.
pub fn is_same_state<S: 'static>(origin: &S, partial: &Partial<S>) -> bool {
    partial.is_empty() || partial.matches(origin)
}

/// What to commit to a store: a patch, or a reducer producing one from the
/// current state.
pub enum Update<S> {
    Partial(Partial<S>),
    Reducer(Box<dyn FnOnce(&S) -> Partial<S> + Send>),
}

impl<S: 'static> Update<S> {
    pub fn reducer<F>(f: F) -> Self
    where
        F: FnOnce(&S) -> Partial<S> + Send + 'static,
    {
        Update::Reducer(Box::new(f))
    }

    /// Resolve against the current state.
    pub fn resolve(self, current: &S) -> Partial<S> {
        match self {
            Update::Partial(partial) => partial,
            Update::Reducer(f) => f(current),
        }
    }
}

impl<S> From<Partial<S>> for Update<S> {
    fn from(partial: Partial<S>) -> Self {
        Update::Partial(partial)
    }
}
