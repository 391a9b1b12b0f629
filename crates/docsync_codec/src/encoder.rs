//! Document frame encoder.

use crate::error::{CodecError, CodecResult};
use crate::value::{Document, Value};

pub(crate) const TYPE_DOUBLE: u8 = 0x01;
pub(crate) const TYPE_STRING: u8 = 0x02;
pub(crate) const TYPE_DOCUMENT: u8 = 0x03;
pub(crate) const TYPE_ARRAY: u8 = 0x04;
pub(crate) const TYPE_BINARY: u8 = 0x05;
pub(crate) const TYPE_OBJECT_ID: u8 = 0x07;
pub(crate) const TYPE_BOOLEAN: u8 = 0x08;
pub(crate) const TYPE_DATETIME: u8 = 0x09;
pub(crate) const TYPE_NULL: u8 = 0x0a;
pub(crate) const TYPE_INT32: u8 = 0x10;
pub(crate) const TYPE_INT64: u8 = 0x12;

/// Encode a single document to one self-describing frame.
///
/// # Errors
///
/// Returns an error if a key contains a NUL byte or the frame would exceed
/// the 32-bit length prefix.
pub fn encode_document(document: &Document) -> CodecResult<Vec<u8>> {
    let mut encoder = DocumentEncoder::new();
    encoder.encode(document)?;
    Ok(encoder.into_bytes())
}

/// Encode a sequence of documents as concatenated frames, in input order.
///
/// An empty sequence encodes to an empty buffer.
///
/// # Errors
///
/// Returns an error if any document fails to encode.
pub fn encode_many<'a, I>(documents: I) -> CodecResult<Vec<u8>>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut encoder = DocumentEncoder::new();
    for document in documents {
        encoder.encode(document)?;
    }
    Ok(encoder.into_bytes())
}

/// A document frame encoder.
///
/// Frames are appended to an internal buffer, so one encoder can produce a
/// whole multi-document payload.
pub struct DocumentEncoder {
    buffer: Vec<u8>,
}

impl DocumentEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Append one document frame.
    pub fn encode(&mut self, document: &Document) -> CodecResult<()> {
        let start = self.buffer.len();
        // Length placeholder, patched once the body is written
        self.buffer.extend_from_slice(&[0; 4]);
        for (key, value) in document.iter() {
            self.encode_element(key, value)?;
        }
        self.buffer.push(0x00);
        self.patch_length(start)
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn encode_element(&mut self, key: &str, value: &Value) -> CodecResult<()> {
        self.buffer.push(element_type(value));
        self.encode_cstring(key)?;

        match value {
            Value::Double(n) => self.buffer.extend_from_slice(&n.to_le_bytes()),
            Value::String(s) => self.encode_string(s)?,
            Value::Document(doc) => self.encode(doc)?,
            Value::Array(items) => self.encode_array(items)?,
            Value::Binary { subtype, bytes } => {
                self.encode_len(bytes.len())?;
                self.buffer.push(*subtype);
                self.buffer.extend_from_slice(bytes);
            }
            Value::ObjectId(id) => self.buffer.extend_from_slice(id.as_bytes()),
            Value::Boolean(b) => self.buffer.push(u8::from(*b)),
            Value::DateTime(ms) => self.buffer.extend_from_slice(&ms.to_le_bytes()),
            Value::Null => {}
            Value::Int32(n) => self.buffer.extend_from_slice(&n.to_le_bytes()),
            Value::Int64(n) => self.buffer.extend_from_slice(&n.to_le_bytes()),
        }
        Ok(())
    }

    fn encode_array(&mut self, items: &[Value]) -> CodecResult<()> {
        // Arrays are documents keyed "0", "1", ...
        let start = self.buffer.len();
        self.buffer.extend_from_slice(&[0; 4]);
        for (index, item) in items.iter().enumerate() {
            self.encode_element(&index.to_string(), item)?;
        }
        self.buffer.push(0x00);
        self.patch_length(start)
    }

    fn encode_cstring(&mut self, key: &str) -> CodecResult<()> {
        if key.as_bytes().contains(&0) {
            return Err(CodecError::encoding_failed(format!(
                "field name contains NUL byte: {key:?}"
            )));
        }
        self.buffer.extend_from_slice(key.as_bytes());
        self.buffer.push(0x00);
        Ok(())
    }

    fn encode_string(&mut self, s: &str) -> CodecResult<()> {
        self.encode_len(s.len() + 1)?;
        self.buffer.extend_from_slice(s.as_bytes());
        self.buffer.push(0x00);
        Ok(())
    }

    fn encode_len(&mut self, len: usize) -> CodecResult<()> {
        let len = i32::try_from(len)
            .map_err(|_| CodecError::encoding_failed(format!("length {len} exceeds i32")))?;
        self.buffer.extend_from_slice(&len.to_le_bytes());
        Ok(())
    }

    fn patch_length(&mut self, start: usize) -> CodecResult<()> {
        let len = self.buffer.len() - start;
        let len = i32::try_from(len)
            .map_err(|_| CodecError::encoding_failed(format!("document of {len} bytes")))?;
        self.buffer[start..start + 4].copy_from_slice(&len.to_le_bytes());
        Ok(())
    }
}

impl Default for DocumentEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn element_type(value: &Value) -> u8 {
    match value {
        Value::Double(_) => TYPE_DOUBLE,
        Value::String(_) => TYPE_STRING,
        Value::Document(_) => TYPE_DOCUMENT,
        Value::Array(_) => TYPE_ARRAY,
        Value::Binary { .. } => TYPE_BINARY,
        Value::ObjectId(_) => TYPE_OBJECT_ID,
        Value::Boolean(_) => TYPE_BOOLEAN,
        Value::DateTime(_) => TYPE_DATETIME,
        Value::Null => TYPE_NULL,
        Value::Int32(_) => TYPE_INT32,
        Value::Int64(_) => TYPE_INT64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_id::ObjectId;

    #[test]
    fn encode_empty_document() {
        let bytes = encode_document(&Document::new()).unwrap();
        assert_eq!(bytes, vec![0x05, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn encode_int32_field() {
        let doc = Document::new().with("a", 1);
        let bytes = encode_document(&doc).unwrap();
        assert_eq!(
            bytes,
            vec![0x0c, 0, 0, 0, 0x10, b'a', 0, 0x01, 0, 0, 0, 0x00]
        );
    }

    #[test]
    fn encode_string_field() {
        let doc = Document::new().with("s", "hi");
        let bytes = encode_document(&doc).unwrap();
        // len(4) + type(1) + "s\0"(2) + strlen(4) + "hi\0"(3) + terminator(1)
        assert_eq!(
            bytes,
            vec![0x0f, 0, 0, 0, 0x02, b's', 0, 0x03, 0, 0, 0, b'h', b'i', 0, 0x00]
        );
    }

    #[test]
    fn encode_null_and_bool() {
        let doc = Document::new().with("n", ()).with("b", true);
        let bytes = encode_document(&doc).unwrap();
        assert_eq!(
            bytes,
            vec![0x0c, 0, 0, 0, 0x0a, b'n', 0, 0x08, b'b', 0, 0x01, 0x00]
        );
    }

    #[test]
    fn encode_array_uses_index_keys() {
        let doc = Document::new().with("l", vec![Value::Int32(7), Value::Int32(8)]);
        let bytes = encode_document(&doc).unwrap();
        let inner = [
            0x13, 0, 0, 0, 0x10, b'0', 0, 7, 0, 0, 0, 0x10, b'1', 0, 8, 0, 0, 0, 0x00,
        ];
        assert_eq!(bytes[4], TYPE_ARRAY);
        assert_eq!(&bytes[7..7 + inner.len()], &inner);
    }

    #[test]
    fn encode_object_id_field() {
        let id = ObjectId::from_bytes([0xab; 12]);
        let doc = Document::new().with("_id", id);
        let bytes = encode_document(&doc).unwrap();
        assert_eq!(bytes.len(), 4 + 1 + 4 + 12 + 1);
        assert_eq!(&bytes[9..21], &[0xab; 12]);
    }

    #[test]
    fn encode_many_concatenates_in_order() {
        let first = Document::new().with("n", 1);
        let second = Document::new().with("n", 2);

        let bytes = encode_many([&first, &second]).unwrap();
        let a = encode_document(&first).unwrap();
        let b = encode_document(&second).unwrap();
        assert_eq!(bytes, [a, b].concat());
    }

    #[test]
    fn encode_many_empty() {
        let docs: Vec<Document> = Vec::new();
        assert!(encode_many(&docs).unwrap().is_empty());
    }

    #[test]
    fn reject_nul_in_key() {
        let doc = Document::new().with("a\0b", 1);
        assert!(matches!(
            encode_document(&doc),
            Err(CodecError::EncodingFailed { .. })
        ));
    }
}
