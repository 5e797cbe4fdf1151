//! Store Provider
//!
//! [`create_store`] turns a root model into a [`StoreKit`]. The kit hands
//! out a default context (the model's initial state, no actions) for
//! readers outside any provider, and mounts [`Provider`]s.
//!
//! A mounted provider owns the canonical state for its subtree. Its action
//! set is built exactly once per mount, and the context it publishes after
//! each commit pairs the new state with that same action set, so readers
//! that only use actions see a reference-stable value across commits.
//! Mounting again yields a fresh, independent state.

use std::fmt;
use std::sync::Arc;

use super::model::Model;
use super::partial::{is_same_state, Update};
use super::scope::{Callback, Store};
use crate::error::StoreError;
use crate::reactive::{memo, Memo, Signal, Subscription};

/// The value a provider publishes to its readers.
pub struct Context<S, A> {
    pub state: Arc<S>,
    /// `None` outside a mounted provider.
    pub actions: Option<Arc<A>>,
}

impl<S: fmt::Debug, A> fmt::Debug for Context<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.state)
            .field("has_actions", &self.actions.is_some())
            .finish()
    }
}

/// Store over a provider's own state.
///
/// Writes merge shallowly into a copy of the state. A write that changes
/// nothing keeps the current state object and notifies nobody.
struct RootStore<S>
where
    S: Send + Sync + 'static,
{
    state: Signal<Arc<S>>,
}

impl<S> Store<S> for RootStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn get(&self) -> Arc<S> {
        self.state.get()
    }

    fn set(&self, update: Update<S>, callback: Option<Callback>) {
        self.state.update(|current| {
            let partial = update.resolve(current);
            if is_same_state(&**current, &partial) {
                return Arc::clone(current);
            }
            tracing::trace!(fields = ?partial.keys().collect::<Vec<_>>(), "provider commit");
            Arc::new(partial.apply_to(current))
        });

        if let Some(callback) = callback {
            callback();
        }
    }
}

type ContextMemo<S, A> = Memo<(Arc<S>, Arc<A>), Context<S, A>>;

/// Everything [`create_store`] produces for one root model.
pub struct StoreKit<S: 'static, A> {
    model: Model<S, A>,
    default_context: Arc<Context<S, A>>,
}

impl<S, A> StoreKit<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    /// What readers see when no provider encloses them.
    pub fn default_context(&self) -> Arc<Context<S, A>> {
        Arc::clone(&self.default_context)
    }

    pub fn model(&self) -> &Model<S, A> {
        &self.model
    }

    /// Mount a provider with a fresh copy of the model's state.
    pub fn mount(&self) -> Result<Provider<S, A>, StoreError> {
        Provider::mount(&self.model)
    }
}

/// Build the context, default value and provider factory for `model`.
pub fn create_store<S, A>(model: Model<S, A>) -> StoreKit<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    let default_context = Arc::new(Context {
        state: Arc::clone(&model.state),
        actions: None,
    });
    StoreKit {
        model,
        default_context,
    }
}

/// One mounted provider: the state, store and actions of a subtree.
pub struct Provider<S, A>
where
    S: Send + Sync + 'static,
{
    state: Signal<Arc<S>>,
    store: Arc<dyn Store<S>>,
    actions: Arc<A>,
    context: Arc<ContextMemo<S, A>>,
}

impl<S, A> Provider<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    /// Name shown for the provider in component trees.
    pub const DISPLAY_NAME: &'static str = "NoRedux-Root";

    fn mount(model: &Model<S, A>) -> Result<Self, StoreError> {
        let state = Signal::new(Arc::new((*model.state).clone()));
        let store: Arc<dyn Store<S>> = Arc::new(RootStore {
            state: state.clone(),
        });
        let actions = Arc::new(model.build(Arc::clone(&store))?);
        let context: Arc<ContextMemo<S, A>> = Arc::new(memo(|(state, actions): &(Arc<S>, Arc<A>)| Context {
            state: Arc::clone(state),
            actions: Some(Arc::clone(actions)),
        }));
        tracing::debug!(state = std::any::type_name::<S>(), "provider mounted");

        Ok(Self {
            state,
            store,
            actions,
            context,
        })
    }

    /// Current state.
    pub fn state(&self) -> Arc<S> {
        self.state.get()
    }

    /// The action set built for this mount.
    pub fn actions(&self) -> Arc<A> {
        Arc::clone(&self.actions)
    }

    /// The provider's root store.
    pub fn store(&self) -> Arc<dyn Store<S>> {
        Arc::clone(&self.store)
    }

    /// The current `{ state, actions }` value.
    ///
    /// Repeated calls return the same `Arc` until the next commit.
    pub fn context(&self) -> Arc<Context<S, A>> {
        self.context.call((self.state.get(), Arc::clone(&self.actions)))
    }

    /// Call `listener` with the new context after every commit.
    pub fn listen<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<Context<S, A>>) + Send + Sync + 'static,
    {
        let context = Arc::clone(&self.context);
        let actions = Arc::clone(&self.actions);
        self.state.listen(move |state| {
            let value = context.call((Arc::clone(state), Arc::clone(&actions)));
            listener(&value);
        })
    }
}

impl<S, A> fmt::Debug for Provider<S, A>
where
    S: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens;
    use crate::store::{make_model, Partial};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        count: i32,
        step: i32,
    }

    struct CounterActions {
        store: Arc<dyn Store<Counter>>,
    }

    impl CounterActions {
        fn increment(&self) {
            self.store.set(
                Update::reducer(|prev: &Counter| Partial::new().with(lens!(Counter, count), prev.count + prev.step)),
                None,
            );
        }

        fn set_step(&self, step: i32) {
            self.store.patch(Partial::new().with(lens!(Counter, step), step));
        }
    }

    fn kit() -> StoreKit<Counter, CounterActions> {
        create_store(make_model(Counter { count: 0, step: 1 }, |store| CounterActions { store }))
    }

    #[test]
    fn default_context_has_no_actions() {
        let kit = kit();
        let context = kit.default_context();
        assert!(Arc::ptr_eq(&context.state, &kit.model().state));
        assert!(context.actions.is_none());
    }

    #[test]
    fn mount_copies_state() {
        let kit = kit();
        let provider = kit.mount().unwrap();
        assert_eq!(*provider.state(), *kit.model().state);
        assert!(!Arc::ptr_eq(&provider.state(), &kit.model().state));
    }

    #[test]
    fn actions_survive_commits() {
        let provider = kit().mount().unwrap();
        let before = provider.context();
        assert!(Arc::ptr_eq(&before, &provider.context()));

        provider.actions().increment();
        let after = provider.context();

        assert_eq!(after.state.count, 1);
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(Arc::ptr_eq(
            before.actions.as_ref().unwrap(),
            after.actions.as_ref().unwrap()
        ));
    }

    #[test]
    fn no_op_write_keeps_state_and_stays_silent() {
        let provider = kit().mount().unwrap();
        let published = Arc::new(AtomicUsize::new(0));
        let counter = published.clone();
        let _sub = provider.listen(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let state = provider.state();
        provider.actions().set_step(1);
        assert!(Arc::ptr_eq(&state, &provider.state()));
        assert_eq!(published.load(Ordering::SeqCst), 0);

        provider.actions().set_step(2);
        provider.actions().increment();
        assert_eq!(published.load(Ordering::SeqCst), 2);
        assert_eq!(*provider.state(), Counter { count: 2, step: 2 });
    }

    #[test]
    fn listeners_receive_current_context() {
        let provider = kit().mount().unwrap();
        let expected = Arc::new(parking_lot::Mutex::new(None));
        let sink = expected.clone();
        let _sub = provider.listen(move |context| {
            *sink.lock() = Some(Arc::clone(context));
        });

        provider.actions().increment();
        let published = expected.lock().clone().unwrap();
        assert!(Arc::ptr_eq(&published, &provider.context()));
    }

    #[test]
    fn concurrent_reducers_are_not_lost() {
        let provider = kit().mount().unwrap();
        let actions = provider.actions();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let actions = Arc::clone(&actions);
                scope.spawn(move || {
                    for _ in 0..1_000 {
                        actions.increment();
                    }
                });
            }
        });

        assert_eq!(provider.state().count, 4_000);
    }

    #[test]
    fn mounts_are_independent() {
        let kit = kit();
        let first = kit.mount().unwrap();
        let second = kit.mount().unwrap();

        first.actions().increment();
        assert_eq!(first.state().count, 1);
        assert_eq!(second.state().count, 0);
    }

    #[test]
    fn display_name() {
        assert_eq!(Provider::<Counter, CounterActions>::DISPLAY_NAME, "NoRedux-Root");
    }
}
