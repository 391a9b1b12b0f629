//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a document.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Invalid frame structure.
    #[error("invalid document structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// Element type byte this codec does not understand.
    #[error("unsupported element type 0x{type_byte:02x}")]
    UnsupportedType {
        /// The raw element type byte.
        type_byte: u8,
    },

    /// A declared length exceeds the allowed maximum or the input.
    #[error("size limit exceeded: claimed {claimed}, max allowed {max_allowed}")]
    SizeLimitExceeded {
        /// Length claimed by the input.
        claimed: u64,
        /// Maximum that was allowed at that point.
        max_allowed: u64,
    },

    /// Documents are nested deeper than the decoder accepts.
    #[error("nesting depth exceeds {max}")]
    DepthLimitExceeded {
        /// Maximum accepted depth.
        max: usize,
    },

    /// Payload was not valid base64.
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    /// Text was not a valid object id.
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    /// An id-set document contained a value that is not an object id.
    #[error("id set value under key '{key}' is not an object id")]
    NotAnIdentifier {
        /// Key of the offending value.
        key: String,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}
