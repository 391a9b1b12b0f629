//! Document store trait definition.

use crate::clock::Timestamp;
use crate::error::StoreResult;
use docsync_codec::{Document, ObjectId};

/// A document together with its modification stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// The document, including its `_id` field.
    pub document: Document,
    /// Stamp of the last insert or update of this document.
    pub modified: Timestamp,
}

/// A read result together with the collection stamp seen by the same read.
///
/// Every write missing from `value` carries a stamp above `last_modified`,
/// so `last_modified` is safe to use as a delta checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Marked<T> {
    /// The documents read.
    pub value: T,
    /// Collection last-modified stamp at the moment of the read.
    pub last_modified: Timestamp,
}

/// A persistent, collection-scoped document store.
///
/// Every operation takes the collection name first and creates the
/// collection on demand. Documents are keyed by their `_id` object id.
///
/// # Invariants
///
/// - Each stored document has exactly one identifier, unique in its collection
/// - A document's stamp strictly increases on every write to it
/// - `last_modified` never decreases and is at least every stored stamp
/// - `delete` advances `last_modified` even when nothing was removed
/// - the `*_with_mark` reads never return a stamp older than a write they miss
///
/// Each call is atomic on its own. There is no cross-call transaction, so
/// two concurrent writes to the same identifier resolve as last write wins.
///
/// # Implementors
///
/// - [`super::MemoryStore`] - Reference implementation kept in memory
pub trait DocumentStore: Send + Sync {
    /// Stores a document that has no identifier yet.
    ///
    /// Generates an identifier, writes it into `_id`, stamps the document
    /// and returns the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IdentifierPresent`](crate::StoreError::IdentifierPresent)
    /// if the document already carries an `_id`.
    fn insert(&self, collection: &str, document: Document) -> StoreResult<ObjectId>;

    /// Stores a document under the identifier it carries.
    ///
    /// Inserts when the identifier is unknown, otherwise overwrites. The
    /// document is re-stamped either way.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingIdentifier`](crate::StoreError::MissingIdentifier)
    /// if the document has no `_id`.
    fn upsert(&self, collection: &str, document: Document) -> StoreResult<ObjectId>;

    /// Overwrites an existing document and re-stamps it.
    ///
    /// Unknown identifiers are a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingIdentifier`](crate::StoreError::MissingIdentifier)
    /// if the document has no `_id`.
    fn update(&self, collection: &str, document: Document) -> StoreResult<()>;

    /// Looks up one document.
    fn find(&self, collection: &str, id: ObjectId) -> StoreResult<Option<Document>>;

    /// Returns all live documents in no particular order.
    fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Returns the documents among `ids` that currently exist.
    ///
    /// Absent identifiers are skipped and duplicates appear once.
    fn find_by_ids(&self, collection: &str, ids: &[ObjectId]) -> StoreResult<Vec<Document>>;

    /// Returns the documents stamped strictly after `since`, oldest first.
    fn find_since(&self, collection: &str, since: Timestamp) -> StoreResult<Vec<StoredDocument>>;

    /// Like [`DocumentStore::find_all`], paired with the collection stamp
    /// observed atomically with the documents.
    fn find_all_with_mark(&self, collection: &str) -> StoreResult<Marked<Vec<Document>>>;

    /// Like [`DocumentStore::find_by_ids`], paired with the collection stamp
    /// observed atomically with the documents.
    fn find_by_ids_with_mark(
        &self,
        collection: &str,
        ids: &[ObjectId],
    ) -> StoreResult<Marked<Vec<Document>>>;

    /// Like [`DocumentStore::find_since`], paired with the collection stamp
    /// observed atomically with the documents.
    fn find_since_with_mark(
        &self,
        collection: &str,
        since: Timestamp,
    ) -> StoreResult<Marked<Vec<StoredDocument>>>;

    /// Removes a document if present and advances the collection stamp.
    ///
    /// Deleting an unknown identifier succeeds.
    fn delete(&self, collection: &str, id: ObjectId) -> StoreResult<()>;

    /// Returns the largest stamp ever issued in the collection, or 0.
    fn last_modified(&self, collection: &str) -> StoreResult<Timestamp>;

    /// Returns the names of all collections written so far.
    fn collections(&self) -> StoreResult<Vec<String>>;

    /// Returns the number of live documents in the collection.
    fn count(&self, collection: &str) -> StoreResult<usize>;

    /// Stores a document, assigning an identifier only if it has none.
    ///
    /// Dispatches to [`DocumentStore::upsert`] for documents carrying an
    /// `_id` and to [`DocumentStore::insert`] otherwise.
    fn save(&self, collection: &str, document: Document) -> StoreResult<ObjectId> {
        if document.id().is_some() {
            self.upsert(collection, document)
        } else {
            self.insert(collection, document)
        }
    }
}

/// Checks that a collection name can be used in a request path.
///
/// # Errors
///
/// Returns [`StoreError::InvalidCollection`](crate::StoreError::InvalidCollection)
/// for empty names and names containing `/` or NUL.
pub fn validate_collection(name: &str) -> StoreResult<()> {
    if name.is_empty() || name.contains(['/', '\0']) {
        return Err(crate::StoreError::InvalidCollection(name.to_string()));
    }
    Ok(())
}
