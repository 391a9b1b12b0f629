//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The operation needs a document that carries an `_id`.
    #[error("document has no identifier")]
    MissingIdentifier,

    /// The operation assigns identity itself and the document already has one.
    #[error("document already carries an identifier")]
    IdentifierPresent,

    /// The collection name is not acceptable.
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),

    /// The underlying medium cannot serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true if retrying later might succeed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
