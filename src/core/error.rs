//! Error types for the knowledge graph core
//!
//! Storage failures are wrapped, never swallowed. CLI handlers turn these
//! into human-facing messages through `anyhow`.

use thiserror::Error;

/// Errors produced by the record store, graph index, search and traversal
#[derive(Debug, Error)]
pub enum GraphError {
    /// A user-supplied id collides with an existing record of the same type
    #[error("{record_type} ID {id} already exists")]
    DuplicateIdentifier { record_type: String, id: String },

    /// Lookup by id found nothing
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Edge creation referenced a node that does not exist
    #[error("Node {0} does not exist")]
    DanglingReference(String),

    /// No registry entry for a record type or table name
    #[error("Unregistered record type: {0}")]
    UnregisteredType(String),

    /// A free-text reference matched more than one record
    #[error("'{reference}' matches {count} records; be more specific or use an ID")]
    AmbiguousMatch { reference: String, count: usize },

    /// Invalid field value supplied by a caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl GraphError {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        GraphError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn invalid<T: Into<String>>(msg: T) -> Self {
        GraphError::InvalidInput(msg.into())
    }

    /// True for lookups that callers may recover from by searching instead
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
