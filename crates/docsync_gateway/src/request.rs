//! Protocol request routing.

use crate::error::{GatewayError, GatewayResult};
use axum::http::Method;
use docsync_codec::{decode_id_set, ObjectId};
use docsync_store::{validate_collection, Timestamp};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;

/// Path segment that selects a modification-time query.
pub const MTIME_SEGMENT: &str = "mtime";

/// A parsed protocol request.
///
/// Parsing validates every path parameter, so a request that reaches the
/// store is already known to be well formed apart from its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequest {
    /// `PUT /{collection}`: save new documents.
    Put {
        /// Target collection.
        collection: String,
    },
    /// `POST /{collection}`: update documents that carry an identifier.
    Post {
        /// Target collection.
        collection: String,
    },
    /// `GET /{collection}`: list every document.
    GetAll {
        /// Target collection.
        collection: String,
    },
    /// `GET /{collection}/mtime/{time}`: documents changed after `since`.
    GetSince {
        /// Target collection.
        collection: String,
        /// Exclusive lower bound on modification stamps.
        since: Timestamp,
    },
    /// `GET /{collection}/{ids}`: documents named by a base64 id set.
    GetByIds {
        /// Target collection.
        collection: String,
        /// Requested identifiers, de-duplicated.
        ids: Vec<ObjectId>,
    },
    /// `DELETE /{collection}/{id}`: remove one document.
    Delete {
        /// Target collection.
        collection: String,
        /// Identifier to remove.
        id: ObjectId,
    },
}

impl SyncRequest {
    /// Resolves a method and path below `/{object_root}`.
    ///
    /// `path` is the raw request path. Each segment is percent-decoded after
    /// splitting, so an escaped `/` stays inside its segment.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::MalformedRequest`] if a segment decodes to invalid UTF-8
    /// - [`GatewayError::NotFound`] if the path is outside the protocol
    /// - [`GatewayError::MethodNotAllowed`] if the path exists for other methods
    /// - [`GatewayError::InvalidTimestamp`], [`GatewayError::InvalidIdentifier`]
    ///   or [`GatewayError::Codec`] for bad path parameters
    pub fn parse(method: &Method, path: &str, object_root: &str) -> GatewayResult<Self> {
        let trimmed = path.trim_start_matches('/');
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let segments = trimmed
            .split('/')
            .map(decode_segment)
            .collect::<GatewayResult<Vec<_>>>()?;

        let (root, rest) = segments
            .split_first()
            .ok_or_else(|| GatewayError::NotFound(path.to_string()))?;
        if root.as_ref() != object_root || rest.is_empty() {
            return Err(GatewayError::NotFound(path.to_string()));
        }

        let collection = rest[0].as_ref();
        if validate_collection(collection).is_err() {
            return Err(GatewayError::NotFound(path.to_string()));
        }
        let collection = collection.to_string();
        let not_allowed = || GatewayError::MethodNotAllowed(method.to_string());
        let params: Vec<&str> = rest[1..].iter().map(AsRef::as_ref).collect();

        match params.as_slice() {
            [] => match *method {
                Method::PUT => Ok(SyncRequest::Put { collection }),
                Method::POST => Ok(SyncRequest::Post { collection }),
                Method::GET => Ok(SyncRequest::GetAll { collection }),
                _ => Err(not_allowed()),
            },
            [segment, time] if *segment == MTIME_SEGMENT => {
                if *method != Method::GET {
                    return Err(not_allowed());
                }
                let since = time
                    .parse::<Timestamp>()
                    .map_err(|_| GatewayError::InvalidTimestamp((*time).to_string()))?;
                Ok(SyncRequest::GetSince { collection, since })
            }
            [param] => match *method {
                Method::GET => Ok(SyncRequest::GetByIds {
                    collection,
                    ids: decode_id_set(param)?,
                }),
                Method::DELETE => {
                    let id = ObjectId::parse_hex(param)
                        .map_err(|_| GatewayError::InvalidIdentifier((*param).to_string()))?;
                    Ok(SyncRequest::Delete { collection, id })
                }
                _ => Err(not_allowed()),
            },
            _ => Err(GatewayError::NotFound(path.to_string())),
        }
    }

    /// Collection addressed by this request.
    pub fn collection(&self) -> &str {
        match self {
            SyncRequest::Put { collection }
            | SyncRequest::Post { collection }
            | SyncRequest::GetAll { collection }
            | SyncRequest::GetSince { collection, .. }
            | SyncRequest::GetByIds { collection, .. }
            | SyncRequest::Delete { collection, .. } => collection,
        }
    }

    /// Returns true for requests that carry a document body.
    pub fn has_body(&self) -> bool {
        matches!(self, SyncRequest::Put { .. } | SyncRequest::Post { .. })
    }
}

fn decode_segment(segment: &str) -> GatewayResult<Cow<'_, str>> {
    percent_decode_str(segment)
        .decode_utf8()
        .map_err(|_| GatewayError::MalformedRequest(format!("path segment {segment:?} is not UTF-8")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use docsync_codec::{encode_document, encode_id_set, CodecError, Document};

    fn parse(method: Method, path: &str) -> GatewayResult<SyncRequest> {
        SyncRequest::parse(&method, path, "object")
    }

    #[test]
    fn collection_routes() {
        assert_eq!(
            parse(Method::PUT, "/object/todos").unwrap(),
            SyncRequest::Put {
                collection: "todos".into()
            }
        );
        assert_eq!(
            parse(Method::POST, "/object/todos/").unwrap(),
            SyncRequest::Post {
                collection: "todos".into()
            }
        );
        assert_eq!(
            parse(Method::GET, "/object/todos").unwrap(),
            SyncRequest::GetAll {
                collection: "todos".into()
            }
        );
    }

    #[test]
    fn mtime_route() {
        assert_eq!(
            parse(Method::GET, "/object/todos/mtime/1700000000000").unwrap(),
            SyncRequest::GetSince {
                collection: "todos".into(),
                since: 1_700_000_000_000
            }
        );
    }

    #[test]
    fn mtime_must_be_integer() {
        assert!(matches!(
            parse(Method::GET, "/object/todos/mtime/yesterday"),
            Err(GatewayError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            parse(Method::GET, "/object/todos/mtime/1.5"),
            Err(GatewayError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn ids_route_decodes_set() {
        let ids = vec![ObjectId::new(), ObjectId::new()];
        let encoded = encode_id_set(&ids).unwrap();
        let path = format!("/object/todos/{encoded}");

        assert_eq!(
            parse(Method::GET, &path).unwrap(),
            SyncRequest::GetByIds {
                collection: "todos".into(),
                ids
            }
        );
    }

    #[test]
    fn ids_route_rejects_garbage() {
        assert!(matches!(
            parse(Method::GET, "/object/todos/%%%"),
            Err(GatewayError::Codec(CodecError::InvalidBase64(_)))
        ));
    }

    #[test]
    fn delete_route() {
        let id = ObjectId::new();
        let path = format!("/object/todos/{id}");
        assert_eq!(
            parse(Method::DELETE, &path).unwrap(),
            SyncRequest::Delete {
                collection: "todos".into(),
                id
            }
        );
        assert!(matches!(
            parse(Method::DELETE, "/object/todos/not-an-id"),
            Err(GatewayError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn unknown_paths() {
        assert!(matches!(
            parse(Method::GET, "/"),
            Err(GatewayError::NotFound(_))
        ));
        assert!(matches!(
            parse(Method::GET, "/object"),
            Err(GatewayError::NotFound(_))
        ));
        assert!(matches!(
            parse(Method::GET, "/elsewhere/todos"),
            Err(GatewayError::NotFound(_))
        ));
        assert!(matches!(
            parse(Method::GET, "/object/todos/a/b/c"),
            Err(GatewayError::NotFound(_))
        ));
        assert!(matches!(
            parse(Method::GET, "/object//x"),
            Err(GatewayError::NotFound(_))
        ));
    }

    #[test]
    fn wrong_methods() {
        assert!(matches!(
            parse(Method::DELETE, "/object/todos"),
            Err(GatewayError::MethodNotAllowed(_))
        ));
        assert!(matches!(
            parse(Method::PUT, "/object/todos/mtime/5"),
            Err(GatewayError::MethodNotAllowed(_))
        ));
        assert!(matches!(
            parse(Method::PATCH, "/object/todos/abc"),
            Err(GatewayError::MethodNotAllowed(_))
        ));
    }

    #[test]
    fn accessors() {
        let request = parse(Method::PUT, "/object/notes").unwrap();
        assert_eq!(request.collection(), "notes");
        assert!(request.has_body());
        assert!(!parse(Method::GET, "/object/notes").unwrap().has_body());
    }

    #[test]
    fn segments_are_percent_decoded() {
        let id = ObjectId::new();
        let payload = encode_document(&Document::new().with("0", id)).unwrap();
        let padded = STANDARD.encode(payload);
        assert!(padded.ends_with('='));
        let escaped = padded
            .replace('=', "%3D")
            .replace('/', "%2F")
            .replace('+', "%2B");

        assert_eq!(
            parse(Method::GET, &format!("/object/todos/{escaped}")).unwrap(),
            SyncRequest::GetByIds {
                collection: "todos".into(),
                ids: vec![id]
            }
        );
        assert_eq!(
            parse(Method::GET, "/object/my%20items/mtime/%31%32").unwrap(),
            SyncRequest::GetSince {
                collection: "my items".into(),
                since: 12
            }
        );
        assert_eq!(
            parse(Method::DELETE, &format!("/%6Fbject/todos/{id}")).unwrap(),
            SyncRequest::Delete {
                collection: "todos".into(),
                id
            }
        );
    }

    #[test]
    fn escaped_slash_stays_in_segment() {
        assert!(matches!(
            parse(Method::GET, "/object/todos%2Fmtime%2F5"),
            Err(GatewayError::NotFound(_))
        ));
        assert!(matches!(
            parse(Method::GET, "/object/todos/%FF"),
            Err(GatewayError::MalformedRequest(_))
        ));
    }
}
