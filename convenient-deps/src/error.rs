//! Error types for dependency tracking.

use crate::ItemId;

/// Error types for descriptor construction, graph queries and persistence.
#[derive(Debug, thiserror::Error)]
pub enum DepsError {
    /// A descriptor configuration named an unknown facet or carried a value
    /// that is neither a boolean nor a collection of identifiers.
    #[error("Invalid dependency descriptor: {0}")]
    InvalidDescriptor(String),

    /// An operation required an item that has no edges in the graph.
    ///
    /// Plain lookups never produce this; an absent item simply has no edges.
    #[error("Item {0} is not present in the dependency graph")]
    UnknownItem(ItemId),

    /// A persisted graph did not match the descriptor state space.
    #[error("Persisted dependency graph is corrupt: {0}")]
    CorruptPersistedGraph(String),

    /// I/O failure while reading or writing persisted state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for dependency operations.
pub type DepsResult<T> = Result<T, DepsError>;
