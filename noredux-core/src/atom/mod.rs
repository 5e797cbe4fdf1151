//! Atoms
//!
//! Atoms are the fine-grained alternative to models: each atom is one
//! piece of state with its own actions, realized lazily inside a
//! [`Registry`] and resolved through a [`Query`].

mod definition;
mod registry;

pub use definition::{Atom, AtomKey, AtomKind, Derive, Factory};
pub use registry::{Handle, Query, Registry};
