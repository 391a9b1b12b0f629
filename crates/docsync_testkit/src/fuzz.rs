//! Fuzz testing harnesses for DocSync.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks.

use crate::fixtures::TestGateway;
use axum::http::Method;
use docsync_codec::{decode_id_set, decode_many, encode_id_set, encode_many, ObjectId};

/// Fuzz target for frame decoding.
///
/// Arbitrary bytes either decode or return an error. Never a panic.
pub fn fuzz_document_decode(data: &[u8]) {
    let _ = decode_many(data);
}

/// Fuzz target for frame round trips.
///
/// Anything that decodes must re-encode and decode to the same documents.
pub fn fuzz_document_roundtrip(data: &[u8]) {
    if let Ok(documents) = decode_many(data) {
        if let Ok(encoded) = encode_many(&documents) {
            let decoded = decode_many(&encoded).expect("re-encoded frames must decode");
            assert_eq!(
                format!("{:?}", documents),
                format!("{:?}", decoded),
                "Roundtrip mismatch"
            );
        }
    }
}

/// Fuzz target for id-set path parameters.
pub fn fuzz_id_set(data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    if let Ok(ids) = decode_id_set(&text) {
        let encoded = encode_id_set(&ids).expect("decoded ids must encode");
        assert_eq!(decode_id_set(&encoded).ok(), Some(ids));
    }
}

/// Fuzz target for gateway requests.
///
/// The first byte picks a verb, bytes up to the first NUL form the path
/// suffix and the rest is the body. No input may produce a server error.
pub fn fuzz_gateway_request(data: &[u8]) {
    let Some((&verb, rest)) = data.split_first() else {
        return;
    };
    let method = match verb % 4 {
        0 => Method::GET,
        1 => Method::PUT,
        2 => Method::POST,
        _ => Method::DELETE,
    };
    let split = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let (suffix, body) = rest.split_at(split);
    let body = body.get(1..).unwrap_or_default();
    let path = format!("/object/{}", String::from_utf8_lossy(suffix));

    let test = TestGateway::new();
    let response = test.handle(&method, &path, body);
    assert!(
        !response.status.is_server_error(),
        "{method} {path} gave {}",
        response.status
    );
}

/// Fuzz target for object id handling.
pub fn fuzz_object_id(data: &[u8]) {
    if let Some(bytes) = data.get(..12) {
        let mut raw = [0u8; 12];
        raw.copy_from_slice(bytes);
        let id = ObjectId::from_bytes(raw);

        assert_eq!(id.as_bytes(), &raw);
        assert_eq!(ObjectId::parse_hex(&id.to_hex()).ok(), Some(id));
        let _ = format!("{id:?}");
    }
}
