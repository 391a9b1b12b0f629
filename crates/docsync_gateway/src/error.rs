//! Error types for the sync gateway.

use axum::http::StatusCode;
use docsync_codec::CodecError;
use docsync_store::StoreError;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Body sent when a POST carries a document without an identifier.
pub const MISSING_ID_BODY: &str = "Missing ID";

/// Errors that can occur in the sync gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Request is structurally wrong.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Write request without a body.
    #[error("request body is empty")]
    EmptyBody,

    /// Body or id-set payload could not be decoded.
    #[error("undecodable payload: {0}")]
    Codec(#[from] CodecError),

    /// The `mtime` path segment is not an integer.
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// A path segment or `_id` value is not an object id.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Too many documents in one write request.
    #[error("batch of {count} documents exceeds limit of {max}")]
    BatchTooLarge {
        /// Documents in the request.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A document sent for update has no identifier.
    #[error("{}", MISSING_ID_BODY)]
    MissingIdentifier,

    /// No route matches the path.
    #[error("not found: {0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    /// Store failure.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingIdentifier => GatewayError::MissingIdentifier,
            other => GatewayError::Store(other),
        }
    }
}

impl GatewayError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MalformedRequest(_)
            | GatewayError::EmptyBody
            | GatewayError::Codec(_)
            | GatewayError::InvalidTimestamp(_)
            | GatewayError::InvalidIdentifier(_)
            | GatewayError::BatchTooLarge { .. }
            | GatewayError::MissingIdentifier => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Store(err) if !err.is_unavailable() => StatusCode::BAD_REQUEST,
            GatewayError::Store(_)
            | GatewayError::Config(_)
            | GatewayError::Internal(_)
            | GatewayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}
