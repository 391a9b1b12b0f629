//! Compact text encoding of identifier sets.
//!
//! An id set travels in a URL path segment as the base64 form of a single
//! document whose values are all object ids. Keys carry no meaning.

use crate::decoder::decode_document;
use crate::encoder::encode_document;
use crate::error::{CodecError, CodecResult};
use crate::object_id::ObjectId;
use crate::value::{Document, Value};
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use std::collections::HashSet;

/// Decode a base64 id-set payload.
///
/// Both the URL-safe and the standard alphabet are accepted, with or
/// without padding. Duplicate ids collapse to their first occurrence; the
/// order of first occurrences is preserved.
///
/// # Errors
///
/// Fails if the text is not base64, the bytes are not exactly one
/// well-formed document, or any value is not an object id.
pub fn decode_id_set(text: &str) -> CodecResult<Vec<ObjectId>> {
    let trimmed = text.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;

    let document = decode_document(&bytes)?;

    let mut seen = HashSet::with_capacity(document.len());
    let mut ids = Vec::with_capacity(document.len());
    for (key, value) in document.iter() {
        let Value::ObjectId(id) = value else {
            return Err(CodecError::NotAnIdentifier {
                key: key.to_string(),
            });
        };
        if seen.insert(*id) {
            ids.push(*id);
        }
    }
    Ok(ids)
}

/// Encode ids as a URL-safe base64 id-set payload.
///
/// The document uses the list index of each id as its key.
///
/// # Errors
///
/// Returns an error only if the document cannot be encoded.
pub fn encode_id_set<'a, I>(ids: I) -> CodecResult<String>
where
    I: IntoIterator<Item = &'a ObjectId>,
{
    let document: Document = ids
        .into_iter()
        .enumerate()
        .map(|(index, id)| (index.to_string(), *id))
        .collect();
    Ok(URL_SAFE_NO_PAD.encode(encode_document(&document)?))
}
