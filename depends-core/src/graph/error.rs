//! Error types for graph and tracker operations

use thiserror::Error;

/// Result type for graph and tracker operations
pub type DagResult<T> = Result<T, DagError>;

/// Errors that can occur while mutating or querying a [`Dag`](super::Dag)
/// or a [`Tracker`](crate::tracker::Tracker)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DagError {
    /// The requested link would close a cycle
    #[error("Circular reference detected")]
    CircularReference,

    /// A node, value or handle is not present in the container
    #[error("{what} not found")]
    NotFound {
        /// What kind of thing was looked up
        what: &'static str,
    },

    /// An argument refers to something the operation cannot accept
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// Why the argument was rejected
        reason: String,
    },

    /// A focus-relative tracker operation was called with nothing selected
    #[error("No value is selected")]
    NoFocus,

    /// A snapshot cannot be turned back into a graph
    #[error("Invalid snapshot: {reason}")]
    InvalidSnapshot {
        /// What is wrong with the snapshot
        reason: String,
    },
}

impl DagError {
    /// Creates a not found error
    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }

    /// Creates an invalid argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Creates an invalid snapshot error
    pub fn invalid_snapshot(reason: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            reason: reason.into(),
        }
    }

    /// Returns true for [`DagError::CircularReference`]
    pub fn is_circular_reference(&self) -> bool {
        matches!(self, Self::CircularReference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            DagError::CircularReference.to_string(),
            "Circular reference detected"
        );
        assert_eq!(DagError::not_found("value").to_string(), "value not found");
        assert_eq!(
            DagError::invalid_argument("stale handle").to_string(),
            "Invalid argument: stale handle"
        );
    }

    #[test]
    fn circular_reference_predicate() {
        assert!(DagError::CircularReference.is_circular_reference());
        assert!(!DagError::NoFocus.is_circular_reference());
    }
}
