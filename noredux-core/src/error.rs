//! Error types.
//!
//! Every operation in this crate is a synchronous in-memory computation.
//! Nothing is retried: an operation either succeeds or returns one of these.

use thiserror::Error;

/// Errors raised by composite stores and scoped store bindings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The composite state has no sub-state under this name.
    #[error("no sub-state registered under `{0}`")]
    UnknownKey(String),

    /// The sub-state exists but holds a different type than requested.
    #[error("sub-state `{key}` is not a `{expected}`")]
    TypeMismatch {
        key: String,
        expected: &'static str,
    },
}

/// Errors raised while resolving atoms through a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtomError {
    /// An atom was queried while it was still being realized.
    ///
    /// `path` lists the atoms on the realization stack, outermost first,
    /// ending with the atom that closed the cycle.
    #[error("cyclic dependency: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    /// Realization nested deeper than the configured limit.
    #[error("realization depth exceeded {limit}")]
    DepthExceeded { limit: usize },

    /// The registry behind a query handle has been dropped.
    #[error("the provider owning this query has been dropped")]
    ProviderDropped,

    /// The realized state stored for a key has an unexpected type.
    #[error("atom `{0}` resolved to a state of a different type")]
    TypeMismatch(String),

    /// A store operation failed inside an action or derivation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_path() {
        let err = AtomError::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency: a -> b -> a");
    }

    #[test]
    fn store_error_converts_into_atom_error() {
        let err: AtomError = StoreError::UnknownKey("user".into()).into();
        assert_eq!(err.to_string(), "no sub-state registered under `user`");
    }
}
