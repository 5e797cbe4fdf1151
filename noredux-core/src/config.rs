//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Options for a [`Registry`](crate::atom::Registry).
///
/// The defaults reproduce the classic behavior: dependencies of a computed
/// atom are captured once, on first realization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Re-capture a computed atom's dependencies on every recomputation.
    ///
    /// When off, an atom read only on some derivation paths never gains
    /// or loses a subscription after the first pass.
    pub recapture_dependencies: bool,

    /// Maximum number of atoms that may be mid-realization at once on one
    /// thread before [`AtomError::DepthExceeded`](crate::AtomError) is
    /// returned. Unbounded when `None`.
    pub max_realization_depth: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recapture_dependencies: false,
            max_realization_depth: None,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
