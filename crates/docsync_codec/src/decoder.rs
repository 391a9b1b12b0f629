//! Document frame decoder.

use crate::encoder::{
    TYPE_ARRAY, TYPE_BINARY, TYPE_BOOLEAN, TYPE_DATETIME, TYPE_DOCUMENT, TYPE_DOUBLE, TYPE_INT32,
    TYPE_INT64, TYPE_NULL, TYPE_OBJECT_ID, TYPE_STRING,
};
use crate::error::{CodecError, CodecResult};
use crate::object_id::{ObjectId, OBJECT_ID_LEN};
use crate::value::{Document, Value};

/// Smallest valid frame: length prefix plus terminator.
const MIN_FRAME_LEN: usize = 5;

/// Maximum nesting of embedded documents and arrays.
pub const MAX_DEPTH: usize = 100;

/// Decode exactly one document frame.
///
/// # Errors
///
/// Returns an error if the bytes are not exactly one well-formed frame.
pub fn decode_document(bytes: &[u8]) -> CodecResult<Document> {
    let mut decoder = DocumentDecoder::new(bytes);
    let document = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(CodecError::invalid_structure(format!(
            "{} trailing bytes after document",
            decoder.remaining().len()
        )));
    }
    Ok(document)
}

/// Decode a concatenation of document frames.
///
/// Empty input yields an empty sequence. Any malformed or truncated frame
/// fails the whole call; no partial result is returned.
///
/// # Errors
///
/// Returns the first frame error encountered.
pub fn decode_many(bytes: &[u8]) -> CodecResult<Vec<Document>> {
    let mut decoder = DocumentDecoder::new(bytes);
    let mut documents = Vec::new();
    while !decoder.is_empty() {
        documents.push(decoder.decode()?);
    }
    Ok(documents)
}

/// A streaming document frame decoder.
pub struct DocumentDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> DocumentDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    /// Decode the next document frame.
    pub fn decode(&mut self) -> CodecResult<Document> {
        let end = self.frame_end()?;
        let mut document = Document::new();
        self.enter()?;
        while self.pos < end - 1 {
            let (key, value) = self.decode_element()?;
            document.insert(key, value);
        }
        self.leave(end)?;
        Ok(document)
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Reads a frame's length prefix and returns the absolute end offset.
    fn frame_end(&mut self) -> CodecResult<usize> {
        let start = self.pos;
        let declared = self.read_i32()?;
        let len = usize::try_from(declared)
            .ok()
            .filter(|len| *len >= MIN_FRAME_LEN)
            .ok_or_else(|| {
                CodecError::invalid_structure(format!("invalid document length {declared}"))
            })?;
        let available = self.data.len() - start;
        if len > available {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len as u64,
                max_allowed: available as u64,
            });
        }
        Ok(start + len)
    }

    fn enter(&mut self) -> CodecResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CodecError::DepthLimitExceeded { max: MAX_DEPTH });
        }
        Ok(())
    }

    fn leave(&mut self, end: usize) -> CodecResult<()> {
        if self.pos != end - 1 {
            return Err(CodecError::invalid_structure(
                "element overruns document length",
            ));
        }
        if self.read_byte()? != 0x00 {
            return Err(CodecError::invalid_structure("missing document terminator"));
        }
        self.depth -= 1;
        Ok(())
    }

    fn decode_element(&mut self) -> CodecResult<(String, Value)> {
        let type_byte = self.read_byte()?;
        let key = self.read_cstring()?;
        let value = match type_byte {
            TYPE_DOUBLE => Value::Double(f64::from_le_bytes(self.read_array()?)),
            TYPE_STRING => Value::String(self.read_string()?),
            TYPE_DOCUMENT => Value::Document(self.decode()?),
            TYPE_ARRAY => Value::Array(self.decode_array()?),
            TYPE_BINARY => {
                let len = self.read_len()?;
                let subtype = self.read_byte()?;
                let bytes = self.read_bytes(len)?.to_vec();
                Value::Binary { subtype, bytes }
            }
            TYPE_OBJECT_ID => {
                Value::ObjectId(ObjectId::from_bytes(self.read_array::<OBJECT_ID_LEN>()?))
            }
            TYPE_BOOLEAN => match self.read_byte()? {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                other => {
                    return Err(CodecError::invalid_structure(format!(
                        "invalid boolean byte {other}"
                    )))
                }
            },
            TYPE_DATETIME => Value::DateTime(i64::from_le_bytes(self.read_array()?)),
            TYPE_NULL => Value::Null,
            TYPE_INT32 => Value::Int32(self.read_i32()?),
            TYPE_INT64 => Value::Int64(i64::from_le_bytes(self.read_array()?)),
            other => return Err(CodecError::UnsupportedType { type_byte: other }),
        };
        Ok((key, value))
    }

    fn decode_array(&mut self) -> CodecResult<Vec<Value>> {
        let end = self.frame_end()?;
        self.enter()?;
        let mut items = Vec::new();
        while self.pos < end - 1 {
            // Index keys are not validated; element order defines the array
            let (_, value) = self.decode_element()?;
            items.push(value);
        }
        self.leave(end)?;
        Ok(items)
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_i32(&mut self) -> CodecResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    fn read_len(&mut self) -> CodecResult<usize> {
        let len = self.read_i32()?;
        let len = usize::try_from(len)
            .map_err(|_| CodecError::invalid_structure(format!("negative length {len}")))?;
        let available = self.data.len() - self.pos;
        if len > available {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len as u64,
                max_allowed: available as u64,
            });
        }
        Ok(len)
    }

    fn read_cstring(&mut self) -> CodecResult<String> {
        let rest = &self.data[self.pos..];
        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(CodecError::UnexpectedEof)?;
        let text = std::str::from_utf8(&rest[..nul]).map_err(|_| CodecError::InvalidUtf8)?;
        self.pos += nul + 1;
        Ok(text.to_string())
    }

    fn read_string(&mut self) -> CodecResult<String> {
        let len = self.read_len()?;
        if len == 0 {
            return Err(CodecError::invalid_structure("string length must include NUL"));
        }
        let bytes = self.read_bytes(len)?;
        let (text, terminator) = bytes.split_at(len - 1);
        if terminator != [0] {
            return Err(CodecError::invalid_structure("string is not NUL-terminated"));
        }
        let text = std::str::from_utf8(text).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(text.to_string())
    }
}
