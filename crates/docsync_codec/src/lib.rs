//! # DocSync Codec
//!
//! Document model and wire encoding for DocSync.
//!
//! This crate provides:
//! - [`Value`] and [`Document`], the schema-less document model
//! - [`ObjectId`], the 12-byte time-ordered document identifier
//! - BSON-style frame encoding of single documents and document streams
//! - The base64 id-set encoding used for batch lookups
//!
//! ## Wire Format
//!
//! Each document is one self-describing frame:
//!
//! ```text
//! int32 total_len (LE) | element* | 0x00
//! element = type:u8 | key:cstring | payload
//! ```
//!
//! A document stream is frames concatenated back to back, so a reader can
//! split the stream using only the length prefixes.
//!
//! ## Usage
//!
//! ```
//! use docsync_codec::{decode_many, encode_many, Document};
//!
//! let docs = vec![
//!     Document::new().with("title", "milk"),
//!     Document::new().with("title", "eggs").with("count", 12),
//! ];
//! let bytes = encode_many(&docs).unwrap();
//! assert_eq!(decode_many(&bytes).unwrap(), docs);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod id_set;
mod object_id;
mod value;

pub use decoder::{decode_document, decode_many, DocumentDecoder, MAX_DEPTH};
pub use encoder::{encode_document, encode_many, DocumentEncoder};
pub use error::{CodecError, CodecResult};
pub use id_set::{decode_id_set, encode_id_set};
pub use object_id::{ObjectId, OBJECT_ID_LEN};
pub use value::{Document, Value, ID_FIELD};

/// Trait for types that can be encoded to a document stream.
pub trait Encode {
    /// Encode this value to bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from a document stream.
pub trait Decode: Sized {
    /// Decode this value from bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl Encode for Document {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        encode_document(self)
    }
}

impl Decode for Document {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        decode_document(bytes)
    }
}

impl Encode for [Document] {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        encode_many(self)
    }
}

impl Decode for Vec<Document> {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        decode_many(bytes)
    }
}
