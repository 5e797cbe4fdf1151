//! Stores and Models
//!
//! The store layer builds provider-scoped state on top of the reactive
//! primitives.
//!
//! # Concepts
//!
//! ## Partial updates
//!
//! Every write is a shallow patch ([`Partial`]) addressed through field
//! lenses, or a reducer producing one. A patch whose fields already hold
//! identical values is a no-op.
//!
//! ## Scoped stores
//!
//! A store over a composite state can hand out child stores, one per named
//! sub-state ([`map_store`], [`bind_store`]) or per lens ([`bind_lens`]).
//! Writes through a child replace only its sub-state in the parent.
//!
//! ## Models and providers
//!
//! A [`Model`] is an initial state plus an action factory. Models combine by
//! name into a model over a [`Composite`]. [`create_store`] turns a root
//! model into a [`StoreKit`] that mounts [`Provider`]s.

mod model;
mod partial;
mod provider;
mod scope;

pub use model::{combine_models, make_model, CombinedActions, Factory, Model, Models};
pub use partial::{is_same_state, Lens, Partial, Update};
pub use provider::{create_store, Context, Provider, StoreKit};
pub use scope::{bind_lens, bind_store, map_store, Callback, Composite, Scopes, ScopedStore, Store};
