use std::collections::TryReserveError;

use thiserror::Error;

/// Errors reported by tree construction and insertion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Raw trees need keys of at least one byte.
    #[error("key size must be non-zero")]
    ZeroKeySize,
    /// Raw trees need values of at least one byte.
    #[error("value size must be non-zero")]
    ZeroValueSize,
    /// No ordering function was supplied.
    #[error("comparator is required")]
    MissingComparator,
    /// A raw key did not match the configured key size.
    #[error("key is {actual} bytes, tree expects {expected}")]
    KeySize {
        /// Configured key size.
        expected: usize,
        /// Length of the rejected key.
        actual: usize,
    },
    /// Growing node or blob storage failed; the tree was left as it was.
    #[error("allocation failed: {0}")]
    AllocFailed(#[from] TryReserveError),
}

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
