//! Error types for the memory crate.

use std::fmt;

/// Errors from memory collection operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// A collection was requested with a zero window.
    InvalidWindowSize {
        /// The scope key of the collection.
        scope_key: String,
    },
    /// The persistence layer failed.
    Persistence {
        /// The scope key of the collection.
        scope_key: String,
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWindowSize { scope_key } => {
                write!(f, "memory window size must be at least 1 for {scope_key}")
            }
            Self::Persistence { scope_key, reason } => {
                write!(f, "memory persistence failed for {scope_key}: {reason}")
            }
        }
    }
}

impl std::error::Error for MemoryError {}
