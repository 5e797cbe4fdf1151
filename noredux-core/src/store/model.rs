//! Models
//!
//! A model pairs an initial state with a factory that builds an action set
//! bound to a store over that state. Models compose: several named models
//! combine into one whose state is a [`Composite`] and whose factory wires
//! every sub-model to its own scoped store.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::scope::{map_store, Composite, Part, Scopes, Store};
use crate::error::StoreError;

/// Builds an action set from a store.
pub type Factory<S, A> = Arc<dyn Fn(Arc<dyn Store<S>>) -> Result<A, StoreError> + Send + Sync>;

/// Initial state plus action factory.
pub struct Model<S: 'static, A> {
    pub state: Arc<S>,
    pub factory: Factory<S, A>,
}

impl<S: 'static, A> Model<S, A> {
    /// Model over an already shared state. The model keeps `state` itself,
    /// not a copy.
    pub fn new<F>(state: Arc<S>, factory: F) -> Self
    where
        F: Fn(Arc<dyn Store<S>>) -> A + Send + Sync + 'static,
    {
        Self {
            state,
            factory: Arc::new(move |store: Arc<dyn Store<S>>| Ok::<A, StoreError>(factory(store))),
        }
    }

    /// Model whose factory may fail, e.g. because it binds scoped stores.
    pub fn try_new<F>(state: Arc<S>, factory: F) -> Self
    where
        F: Fn(Arc<dyn Store<S>>) -> Result<A, StoreError> + Send + Sync + 'static,
    {
        Self {
            state,
            factory: Arc::new(factory),
        }
    }

    /// Run the factory against `store`.
    pub fn build(&self, store: Arc<dyn Store<S>>) -> Result<A, StoreError> {
        (self.factory)(store)
    }
}

impl<S: 'static, A> Clone for Model<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<S: fmt::Debug + 'static, A> fmt::Debug for Model<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model").field("state", &self.state).finish_non_exhaustive()
    }
}

/// Build a model from a state and an infallible factory.
pub fn make_model<S, A, F>(state: S, factory: F) -> Model<S, A>
where
    S: 'static,
    F: Fn(Arc<dyn Store<S>>) -> A + Send + Sync + 'static,
{
    Model::new(Arc::new(state), factory)
}

type ErasedFactory = Arc<dyn Fn(&Scopes, &str) -> Result<Part, StoreError> + Send + Sync>;

struct Entry {
    state: Part,
    build: ErasedFactory,
}

/// A named collection of models, ready to be combined.
#[derive(Default)]
pub struct Models {
    entries: IndexMap<String, Entry>,
}

impl Models {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `model` under `name`. A repeated name replaces the earlier model.
    pub fn with<S, A>(mut self, name: impl Into<String>, model: Model<S, A>) -> Self
    where
        S: Clone + Send + Sync + 'static,
        A: Send + Sync + 'static,
    {
        let Model { state, factory } = model;
        let build: ErasedFactory = Arc::new(move |scopes: &Scopes, name: &str| {
            let store = scopes.scope::<S>(name)?;
            let actions = factory(store)?;
            Ok(Arc::new(actions) as Part)
        });
        self.entries.insert(
            name.into(),
            Entry {
                state: state as Part,
                build,
            },
        );
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// The composite initial state: each model's state under its name.
    pub fn state(&self) -> Composite {
        let mut composite = Composite::default();
        for (name, entry) in &self.entries {
            composite.insert(name.clone(), Arc::clone(&entry.state));
        }
        composite
    }

    /// Combine using every model's own factory.
    ///
    /// The resulting action set maps each name to the actions its model
    /// built against its scoped store.
    pub fn combine(self) -> Model<Composite, CombinedActions> {
        let state = Arc::new(self.state());
        let entries = Arc::new(self.entries);
        Model::try_new(state, move |store| {
            let scopes = map_store(store);
            let mut actions = IndexMap::with_capacity(entries.len());
            for (name, entry) in entries.iter() {
                actions.insert(name.clone(), (entry.build)(&scopes, name)?);
            }
            Ok(CombinedActions { actions })
        })
    }
}

impl fmt::Debug for Models {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

/// Combine models with a caller-supplied factory.
///
/// `factory` receives a scoped store per name and returns the composite
/// action set.
pub fn combine_models<A, F>(models: Models, factory: F) -> Model<Composite, A>
where
    F: Fn(&Scopes) -> Result<A, StoreError> + Send + Sync + 'static,
{
    Model::try_new(Arc::new(models.state()), move |store| factory(&map_store(store)))
}

/// Per-name action sets produced by [`Models::combine`].
pub struct CombinedActions {
    actions: IndexMap<String, Arc<dyn Any + Send + Sync>>,
}

impl CombinedActions {
    /// The action set built for `name`.
    pub fn get<A>(&self, name: &str) -> Result<Arc<A>, StoreError>
    where
        A: Send + Sync + 'static,
    {
        let actions = self
            .actions
            .get(name)
            .ok_or_else(|| StoreError::UnknownKey(name.to_string()))?;
        Arc::clone(actions)
            .downcast::<A>()
            .map_err(|_| StoreError::TypeMismatch {
                key: name.to_string(),
                expected: type_name::<A>(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.actions.keys().map(String::as_str)
    }
}

impl fmt::Debug for CombinedActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.actions.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Counter {
        count: i32,
    }

    #[test]
    fn make_model_keeps_state_and_factory() {
        let state = Arc::new(Counter { count: 1 });
        let model = Model::new(state.clone(), |_store| ());
        assert!(Arc::ptr_eq(&model.state, &state));

        let copy = model.clone();
        assert!(Arc::ptr_eq(&copy.state, &model.state));
    }

    #[test]
    fn combined_state_reuses_sub_states() {
        let counter = make_model(Counter { count: 1 }, |_store| ());
        let label = make_model(String::from("x"), |_store| ());
        let counter_state = counter.state.clone();

        let models = Models::new().with("counter", counter).with("label", label);
        assert_eq!(models.names().collect::<Vec<_>>(), vec!["counter", "label"]);

        let state = models.state();
        assert!(Arc::ptr_eq(&state.get::<Counter>("counter").unwrap(), &counter_state));
        assert_eq!(state.get::<Counter>("counter").unwrap().count, 1);
        assert_eq!(*state.get::<String>("label").unwrap(), "x");
    }
}
