//! Request handlers for sync endpoints.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::request::SyncRequest;
use axum::http::{Method, StatusCode};
use docsync_codec::{decode_many, encode_many, Document, ObjectId, ID_FIELD};
use docsync_store::{DocumentStore, Timestamp};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Body of a [`GatewayResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// No body.
    Empty,
    /// Concatenated document frames.
    Documents(Vec<u8>),
    /// Plain-text message, used for errors.
    Text(String),
}

impl ResponseBody {
    /// Returns the raw body bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ResponseBody::Empty => &[],
            ResponseBody::Documents(bytes) => bytes,
            ResponseBody::Text(text) => text.as_bytes(),
        }
    }

    /// Consumes the body, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ResponseBody::Empty => Vec::new(),
            ResponseBody::Documents(bytes) => bytes,
            ResponseBody::Text(text) => text.into_bytes(),
        }
    }

    /// Media type of the body, if it has one.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            ResponseBody::Empty => None,
            ResponseBody::Documents(_) => Some("application/octet-stream"),
            ResponseBody::Text(_) => Some("text/plain; charset=utf-8"),
        }
    }
}

/// Transport-neutral result of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response payload.
    pub body: ResponseBody,
    /// Collection last-modified stamp, sent as a header on reads.
    pub last_modified: Option<Timestamp>,
}

impl GatewayResponse {
    /// A 200 response without a body.
    pub fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            body: ResponseBody::Empty,
            last_modified: None,
        }
    }

    /// A read response.
    ///
    /// An empty frame stream turns into 204 unless `always_ok` is set.
    fn documents(frames: Vec<u8>, last_modified: Timestamp, always_ok: bool) -> Self {
        let (status, body) = if frames.is_empty() && !always_ok {
            (StatusCode::NO_CONTENT, ResponseBody::Empty)
        } else {
            (StatusCode::OK, ResponseBody::Documents(frames))
        };
        Self {
            status,
            body,
            last_modified: Some(last_modified),
        }
    }

    /// Builds the response for a failed request.
    pub fn from_error(err: &GatewayError) -> Self {
        Self {
            status: err.status(),
            body: ResponseBody::Text(err.to_string()),
            last_modified: None,
        }
    }

    /// Decodes the body back into documents.
    ///
    /// Returns an empty list for bodies that are not document frames.
    pub fn decode_documents(&self) -> GatewayResult<Vec<Document>> {
        match &self.body {
            ResponseBody::Documents(bytes) => Ok(decode_many(bytes)?),
            _ => Ok(Vec::new()),
        }
    }
}

/// The delta-sync gateway.
///
/// Translates protocol requests into calls on a shared [`DocumentStore`].
/// The gateway holds no per-request state, so clones can serve requests
/// concurrently.
///
/// # Example
///
/// ```
/// use docsync_gateway::{GatewayConfig, SyncGateway};
/// use docsync_store::MemoryStore;
/// use axum::http::{Method, StatusCode};
/// use std::sync::Arc;
///
/// let gateway = SyncGateway::new(GatewayConfig::default(), Arc::new(MemoryStore::new()));
/// let response = gateway.handle(&Method::GET, "/object/todos", &[]);
/// assert_eq!(response.status, StatusCode::NO_CONTENT);
/// assert_eq!(response.last_modified, Some(0));
/// ```
#[derive(Clone)]
pub struct SyncGateway {
    config: Arc<GatewayConfig>,
    store: Arc<dyn DocumentStore>,
}

impl SyncGateway {
    /// Creates a gateway over `store`.
    pub fn new(config: GatewayConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Returns the gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Handles one request and converts any failure into an error response.
    pub fn handle(&self, method: &Method, path: &str, body: &[u8]) -> GatewayResponse {
        let result = SyncRequest::parse(method, path, &self.config.object_root)
            .and_then(|request| self.dispatch(request, body));

        match result {
            Ok(response) => response,
            Err(err) => {
                if err.is_server_error() {
                    error!(%method, path, error = %err, "request failed");
                } else {
                    warn!(%method, path, error = %err, "request rejected");
                }
                GatewayResponse::from_error(&err)
            }
        }
    }

    /// Executes a parsed request.
    pub fn dispatch(&self, request: SyncRequest, body: &[u8]) -> GatewayResult<GatewayResponse> {
        debug!(
            collection = request.collection(),
            body_len = body.len(),
            ?request,
            "handling request"
        );

        match request {
            SyncRequest::Put { collection } => self.put_documents(&collection, body),
            SyncRequest::Post { collection } => self.post_documents(&collection, body),
            SyncRequest::GetAll { collection } => self.get_all(&collection),
            SyncRequest::GetSince { collection, since } => self.get_since(&collection, since),
            SyncRequest::GetByIds { collection, ids } => self.get_by_ids(&collection, &ids),
            SyncRequest::Delete { collection, id } => self.delete_document(&collection, id),
        }
    }

    /// Saves every document in `body`.
    ///
    /// Documents without `_id` get a fresh identifier. Documents that carry
    /// one are stored under it.
    pub fn put_documents(&self, collection: &str, body: &[u8]) -> GatewayResult<GatewayResponse> {
        let documents = self.decode_batch(body)?;

        for document in &documents {
            if let Some(value) = document.get(ID_FIELD) {
                if value.as_object_id().is_none() {
                    return Err(GatewayError::InvalidIdentifier(format!(
                        "{ID_FIELD} holds a {}",
                        value.type_name()
                    )));
                }
            }
        }

        self.apply_batch(collection, documents, |store, document| {
            store.save(collection, document).map(|_| ())
        })
    }

    /// Overwrites every document in `body` that exists in the collection.
    ///
    /// Fails with `Missing ID` before any write if a document has no
    /// identifier. Unknown identifiers are skipped.
    pub fn post_documents(&self, collection: &str, body: &[u8]) -> GatewayResult<GatewayResponse> {
        let documents = self.decode_batch(body)?;

        if documents.iter().any(|document| document.id().is_none()) {
            return Err(GatewayError::MissingIdentifier);
        }

        self.apply_batch(collection, documents, |store, document| {
            store.update(collection, document)
        })
    }

    /// Returns every document in the collection.
    ///
    /// The documents and the last-modified stamp come from one store read,
    /// so the stamp is a safe checkpoint for a later delta query.
    pub fn get_all(&self, collection: &str) -> GatewayResult<GatewayResponse> {
        let read = self.store.find_all_with_mark(collection)?;
        let frames = encode_frames(&read.value)?;
        Ok(GatewayResponse::documents(frames, read.last_modified, false))
    }

    /// Returns the documents modified strictly after `since`.
    pub fn get_since(&self, collection: &str, since: Timestamp) -> GatewayResult<GatewayResponse> {
        let read = self.store.find_since_with_mark(collection, since)?;
        let frames = encode_many(read.value.iter().map(|stored| &stored.document))
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(GatewayResponse::documents(frames, read.last_modified, false))
    }

    /// Returns the existing documents among `ids`.
    pub fn get_by_ids(&self, collection: &str, ids: &[ObjectId]) -> GatewayResult<GatewayResponse> {
        let read = self.store.find_by_ids_with_mark(collection, ids)?;
        let frames = encode_frames(&read.value)?;
        Ok(GatewayResponse::documents(frames, read.last_modified, true))
    }

    /// Removes one document. Unknown identifiers succeed.
    pub fn delete_document(&self, collection: &str, id: ObjectId) -> GatewayResult<GatewayResponse> {
        self.store.delete(collection, id)?;
        Ok(GatewayResponse::ok())
    }

    fn decode_batch(&self, body: &[u8]) -> GatewayResult<Vec<Document>> {
        if body.is_empty() {
            return Err(GatewayError::EmptyBody);
        }
        let documents = decode_many(body)?;
        let max = self.config.max_batch_documents;
        if documents.len() > max {
            return Err(GatewayError::BatchTooLarge {
                count: documents.len(),
                max,
            });
        }
        Ok(documents)
    }

    /// Applies `write` to each document, continuing past failures.
    ///
    /// Returns the first failure once the whole batch has been attempted.
    fn apply_batch<F>(
        &self,
        collection: &str,
        documents: Vec<Document>,
        write: F,
    ) -> GatewayResult<GatewayResponse>
    where
        F: Fn(&dyn DocumentStore, Document) -> docsync_store::StoreResult<()>,
    {
        let total = documents.len();
        let mut first_error = None;
        let mut failed = 0usize;

        for document in documents {
            if let Err(err) = write(self.store.as_ref(), document) {
                error!(collection, error = %err, "document write failed");
                failed += 1;
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => {
                warn!(collection, total, failed, "batch partially applied");
                Err(err.into())
            }
            None => {
                debug!(collection, total, "batch applied");
                Ok(GatewayResponse::ok())
            }
        }
    }
}

impl std::fmt::Debug for SyncGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn encode_frames(documents: &[Document]) -> GatewayResult<Vec<u8>> {
    encode_many(documents).map_err(|e| GatewayError::Internal(e.to_string()))
}
