//! Reactive Primitives
//!
//! This module implements the leaf layer of the state engine: identity
//! comparison, the single-slot memo, the signal (mutable cell) and the
//! context stack used for dependency capture.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state with a listener registry.
//! Writing a value that is [`Same`] as the current one is a no-op. Any
//! other write is stored and synchronously announced to every listener.
//!
//! ## Memos
//!
//! A Memo caches the most recent result of a pure function together with
//! the argument tuple that produced it. It is used to keep derived objects
//! (action sets, context values) reference-stable while their inputs are.
//!
//! ## Context
//!
//! The reactive context is a thread-local stack of atoms currently being
//! realized. Computed atoms use it to capture which atoms they read, and
//! registries use it to detect cycles.

mod context;
mod equality;
mod memo;
mod signal;
mod subscriber;

pub use context::{ReactiveContext, Source};
pub use equality::{is_diff_array, Same};
pub use memo::{memo, Memo};
pub use signal::{Getter, Setter, Signal};
pub use subscriber::{Listener, SubscriberId, Subscription};
