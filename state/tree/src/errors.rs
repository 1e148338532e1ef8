//! Error types for Merkle accumulator operations

use thiserror::Error;

/// Errors that can occur during tree operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Tree is full: capacity {capacity}")]
    Full { capacity: usize },

    #[error("Leaf index {index} out of range: tree has {len} leaves")]
    LeafOutOfRange { index: usize, len: usize },
}

/// Result alias for tree operations
pub type TreeResult<T> = Result<T, TreeError>;
