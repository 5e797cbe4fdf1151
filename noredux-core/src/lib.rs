//! NoRedux Core
//!
//! This crate provides a small, provider-scoped state management engine.
//! It implements:
//!
//! - Reactive primitives (identity comparison, signals, single-slot memos)
//! - Partial-update stores, scoped stores and composable models
//! - Providers that own a model's state and a stable action set
//! - Atoms: independently realized value, action and computed state
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Signals, memos, identity and the dependency capture stack
//! - `store`: Partial updates, scoped stores, models and providers
//! - `atom`: Atom definitions and the registry that realizes them
//! - `binding`: The subscribe-and-snapshot primitive hosts render from
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use noredux_core::{create_store, lens, make_model, Partial, Store};
//!
//! #[derive(Clone)]
//! struct User { name: String, age: u32 }
//!
//! struct UserActions { store: Arc<dyn Store<User>> }
//!
//! impl UserActions {
//!     fn rename(&self, name: &str) {
//!         self.store.patch(Partial::new().with(lens!(User, name), name.to_string()));
//!     }
//! }
//!
//! let model = make_model(User { name: "a".into(), age: 1 }, |store| UserActions { store });
//! let provider = create_store(model).mount().unwrap();
//!
//! provider.actions().rename("b");
//! assert_eq!(provider.state().name, "b");
//! assert_eq!(provider.state().age, 1);
//! ```

pub mod atom;
pub mod binding;
pub mod config;
pub mod error;
pub mod reactive;
pub mod store;

pub use atom::{Atom, Handle, Query, Registry};
pub use binding::{Binding, Observable};
pub use config::Config;
pub use error::{AtomError, StoreError};
pub use reactive::{memo, Memo, Same, Signal, Subscription};
pub use store::{
    bind_lens, bind_store, combine_models, create_store, is_same_state, make_model, map_store, Composite, Model,
    Models, Partial, Provider, Store, Update,
};
