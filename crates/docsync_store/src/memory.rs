//! In-memory document store.

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::error::{StoreError, StoreResult};
use crate::store::{validate_collection, DocumentStore, Marked, StoredDocument};
use docsync_codec::{Document, ObjectId, ID_FIELD};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

/// Per-collection state.
#[derive(Debug, Default)]
struct CollectionState {
    documents: HashMap<ObjectId, StoredDocument>,
    /// Largest stamp issued in this collection, deletes included.
    last_modified: Timestamp,
}

impl CollectionState {
    /// Issues the next stamp: never below the clock, always above the last one.
    fn next_stamp(&mut self, now: Timestamp) -> Timestamp {
        let stamp = now.max(self.last_modified.saturating_add(1));
        self.last_modified = stamp;
        stamp
    }

    fn write(&mut self, id: ObjectId, document: Document, now: Timestamp) {
        let modified = self.next_stamp(now);
        self.documents
            .insert(id, StoredDocument { document, modified });
    }

    fn all(&self) -> Vec<Document> {
        self.documents
            .values()
            .map(|stored| stored.document.clone())
            .collect()
    }

    fn by_ids(&self, ids: &[ObjectId]) -> Vec<Document> {
        let mut seen = HashSet::with_capacity(ids.len());
        ids.iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.documents.get(id))
            .map(|stored| stored.document.clone())
            .collect()
    }

    /// Documents stamped after `since`, oldest first.
    fn since(&self, since: Timestamp) -> Vec<StoredDocument> {
        let mut changed: Vec<StoredDocument> = self
            .documents
            .values()
            .filter(|stored| stored.modified > since)
            .cloned()
            .collect();
        changed.sort_by_key(|stored| stored.modified);
        changed
    }

    /// Runs `read` and pairs it with the stamp under the same borrow.
    fn marked<T: Default>(state: Option<&Self>, read: impl FnOnce(&Self) -> T) -> Marked<T> {
        match state {
            Some(state) => Marked {
                value: read(state),
                last_modified: state.last_modified,
            },
            None => Marked {
                value: T::default(),
                last_modified: 0,
            },
        }
    }
}

/// An in-memory document store.
///
/// This store keeps every collection in memory and is suitable for:
/// - Unit and integration tests
/// - Single-node deployments that can afford to lose data on restart
///
/// # Thread Safety
///
/// All collections sit behind one reader-writer lock. Mutations hold the
/// write lock for the whole call, which makes each call atomic.
///
/// # Example
///
/// ```rust
/// use docsync_codec::Document;
/// use docsync_store::{DocumentStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// let id = store.insert("todos", Document::new().with("title", "milk")).unwrap();
/// let found = store.find("todos", id).unwrap().unwrap();
/// assert_eq!(found.id(), Some(id));
/// ```
pub struct MemoryStore {
    collections: RwLock<HashMap<String, CollectionState>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Creates an empty store stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store stamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Runs `f` against the named collection under the write lock,
    /// creating the collection if needed.
    fn write_collection<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut CollectionState, Timestamp) -> T,
    ) -> StoreResult<T> {
        validate_collection(collection)?;
        let now = self.clock.now_millis();
        let mut collections = self.collections.write();
        let state = collections.entry(collection.to_string()).or_default();
        Ok(f(state, now))
    }

    /// Runs `f` against the named collection under the read lock.
    ///
    /// Collections that were never written read as empty.
    fn read_collection<T>(
        &self,
        collection: &str,
        f: impl FnOnce(Option<&CollectionState>) -> T,
    ) -> StoreResult<T> {
        validate_collection(collection)?;
        let collections = self.collections.read();
        Ok(f(collections.get(collection)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("collections", &self.collections.read().len())
            .finish_non_exhaustive()
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&self, collection: &str, mut document: Document) -> StoreResult<ObjectId> {
        if document.contains_key(ID_FIELD) {
            return Err(StoreError::IdentifierPresent);
        }
        self.write_collection(collection, |state, now| {
            let mut id = ObjectId::new();
            while state.documents.contains_key(&id) {
                id = ObjectId::new();
            }
            document.set_id(id);
            state.write(id, document, now);
            trace!(collection, %id, "inserted document");
            id
        })
    }

    fn upsert(&self, collection: &str, document: Document) -> StoreResult<ObjectId> {
        let id = document.id().ok_or(StoreError::MissingIdentifier)?;
        self.write_collection(collection, |state, now| {
            state.write(id, document, now);
            trace!(collection, %id, "upserted document");
            id
        })
    }

    fn update(&self, collection: &str, document: Document) -> StoreResult<()> {
        let id = document.id().ok_or(StoreError::MissingIdentifier)?;
        self.write_collection(collection, |state, now| {
            if state.documents.contains_key(&id) {
                state.write(id, document, now);
                trace!(collection, %id, "updated document");
            } else {
                trace!(collection, %id, "update of unknown document ignored");
            }
        })
    }

    fn find(&self, collection: &str, id: ObjectId) -> StoreResult<Option<Document>> {
        self.read_collection(collection, |state| {
            state
                .and_then(|s| s.documents.get(&id))
                .map(|stored| stored.document.clone())
        })
    }

    fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.read_collection(collection, |state| {
            state.map(CollectionState::all).unwrap_or_default()
        })
    }

    fn find_by_ids(&self, collection: &str, ids: &[ObjectId]) -> StoreResult<Vec<Document>> {
        self.read_collection(collection, |state| {
            state.map(|s| s.by_ids(ids)).unwrap_or_default()
        })
    }

    fn find_since(&self, collection: &str, since: Timestamp) -> StoreResult<Vec<StoredDocument>> {
        self.read_collection(collection, |state| {
            state.map(|s| s.since(since)).unwrap_or_default()
        })
    }

    fn find_all_with_mark(&self, collection: &str) -> StoreResult<Marked<Vec<Document>>> {
        self.read_collection(collection, |state| {
            CollectionState::marked(state, CollectionState::all)
        })
    }

    fn find_by_ids_with_mark(
        &self,
        collection: &str,
        ids: &[ObjectId],
    ) -> StoreResult<Marked<Vec<Document>>> {
        self.read_collection(collection, |state| {
            CollectionState::marked(state, |s| s.by_ids(ids))
        })
    }

    fn find_since_with_mark(
        &self,
        collection: &str,
        since: Timestamp,
    ) -> StoreResult<Marked<Vec<StoredDocument>>> {
        self.read_collection(collection, |state| {
            CollectionState::marked(state, |s| s.since(since))
        })
    }

    fn delete(&self, collection: &str, id: ObjectId) -> StoreResult<()> {
        self.write_collection(collection, |state, now| {
            let removed = state.documents.remove(&id).is_some();
            state.next_stamp(now);
            trace!(collection, %id, removed, "deleted document");
        })
    }

    fn last_modified(&self, collection: &str) -> StoreResult<Timestamp> {
        self.read_collection(collection, |state| state.map_or(0, |s| s.last_modified))
    }

    fn collections(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn count(&self, collection: &str) -> StoreResult<usize> {
        self.read_collection(collection, |state| state.map_or(0, |s| s.documents.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store_at(start: Timestamp) -> (MemoryStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let store = MemoryStore::with_clock(clock.clone());
        (store, clock)
    }

    fn doc(title: &str) -> Document {
        Document::new().with("title", title)
    }

    #[test]
    fn new_collection_is_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.last_modified("todos").unwrap(), 0);
        assert!(store.find_all("todos").unwrap().is_empty());
        assert_eq!(store.count("todos").unwrap(), 0);
        assert!(store.collections().unwrap().is_empty());
    }

    #[test]
    fn insert_assigns_identifier() {
        let (store, _) = store_at(1_000);
        let id = store.insert("todos", doc("milk")).unwrap();

        let found = store.find("todos", id).unwrap().unwrap();
        assert_eq!(found.id(), Some(id));
        assert_eq!(found.get("title").and_then(|v| v.as_str()), Some("milk"));
        assert_eq!(store.last_modified("todos").unwrap(), 1_000);
    }

    #[test]
    fn insert_rejects_existing_identifier() {
        let store = MemoryStore::new();
        let mut document = doc("milk");
        document.set_id(ObjectId::new());

        assert_eq!(
            store.insert("todos", document),
            Err(StoreError::IdentifierPresent)
        );
        assert_eq!(store.count("todos").unwrap(), 0);
    }

    #[test]
    fn save_dispatches_on_identifier() {
        let store = MemoryStore::new();
        let generated = store.save("todos", doc("milk")).unwrap();

        let chosen = ObjectId::new();
        let mut document = doc("eggs");
        document.set_id(chosen);
        assert_eq!(store.save("todos", document).unwrap(), chosen);

        assert_ne!(generated, chosen);
        assert_eq!(store.count("todos").unwrap(), 2);
    }

    #[test]
    fn upsert_inserts_then_overwrites() {
        let (store, _) = store_at(50);
        let id = ObjectId::new();

        let mut first = doc("v1");
        first.set_id(id);
        store.upsert("todos", first).unwrap();

        let mut second = doc("v2");
        second.set_id(id);
        store.upsert("todos", second.clone()).unwrap();

        assert_eq!(store.find("todos", id).unwrap(), Some(second));
        assert_eq!(store.count("todos").unwrap(), 1);
    }

    #[test]
    fn upsert_requires_identifier() {
        let store = MemoryStore::new();
        assert_eq!(
            store.upsert("todos", doc("milk")),
            Err(StoreError::MissingIdentifier)
        );
    }

    #[test]
    fn update_requires_identifier() {
        let store = MemoryStore::new();
        assert_eq!(
            store.update("todos", doc("milk")),
            Err(StoreError::MissingIdentifier)
        );
    }

    #[test]
    fn update_unknown_identifier_is_noop() {
        let store = MemoryStore::new();
        let mut document = doc("ghost");
        document.set_id(ObjectId::new());

        store.update("todos", document).unwrap();
        assert_eq!(store.count("todos").unwrap(), 0);
    }

    #[test]
    fn update_restamps_strictly() {
        // Clock frozen: stamps must still increase
        let (store, _) = store_at(500);
        let id = store.insert("todos", doc("v1")).unwrap();

        let mut changed = store.find("todos", id).unwrap().unwrap();
        changed.insert("title", "v2");
        store.update("todos", changed).unwrap();

        let stamps: Vec<_> = store
            .find_since("todos", 0)
            .unwrap()
            .into_iter()
            .map(|s| s.modified)
            .collect();
        assert_eq!(stamps, vec![501]);
        assert_eq!(store.last_modified("todos").unwrap(), 501);
    }

    #[test]
    fn stamps_survive_clock_going_backwards() {
        let (store, clock) = store_at(1_000);
        store.insert("todos", doc("a")).unwrap();
        clock.set(10);
        store.insert("todos", doc("b")).unwrap();

        assert_eq!(store.last_modified("todos").unwrap(), 1_001);
    }

    #[test]
    fn find_by_ids_returns_existing_subset() {
        let store = MemoryStore::new();
        let a = store.insert("todos", doc("a")).unwrap();
        let b = store.insert("todos", doc("b")).unwrap();
        store.insert("todos", doc("c")).unwrap();
        let missing = ObjectId::new();

        let found = store.find_by_ids("todos", &[a, missing, a, b]).unwrap();
        let ids: Vec<_> = found.iter().filter_map(Document::id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn find_by_ids_on_unknown_collection() {
        let store = MemoryStore::new();
        assert!(store
            .find_by_ids("nothing", &[ObjectId::new()])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn find_since_is_strict() {
        let (store, clock) = store_at(100);
        store.insert("todos", doc("a")).unwrap();
        clock.set(200);
        let b = store.insert("todos", doc("b")).unwrap();

        let since = store.find_since("todos", 100).unwrap();
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].document.id(), Some(b));
        assert_eq!(since[0].modified, 200);

        let latest = store.last_modified("todos").unwrap();
        assert!(store.find_since("todos", latest).unwrap().is_empty());
    }

    #[test]
    fn delete_removes_and_advances_stamp() {
        let (store, _) = store_at(100);
        let id = store.insert("todos", doc("a")).unwrap();
        let before = store.last_modified("todos").unwrap();

        store.delete("todos", id).unwrap();

        assert_eq!(store.find("todos", id).unwrap(), None);
        assert!(store.find_by_ids("todos", &[id]).unwrap().is_empty());
        assert!(store.find_since("todos", 0).unwrap().is_empty());
        assert!(store.last_modified("todos").unwrap() > before);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let id = store.insert("todos", doc("a")).unwrap();
        let keep = store.insert("todos", doc("b")).unwrap();

        store.delete("todos", id).unwrap();
        let docs_after_first = store.find_all("todos").unwrap();
        store.delete("todos", id).unwrap();

        assert_eq!(store.find_all("todos").unwrap(), docs_after_first);
        assert_eq!(store.find("todos", keep).unwrap().and_then(|d| d.id()), Some(keep));
    }

    #[test]
    fn delete_on_unknown_collection_creates_stamp() {
        let store = MemoryStore::new();
        store.delete("fresh", ObjectId::new()).unwrap();
        assert!(store.last_modified("fresh").unwrap() > 0);
        assert_eq!(store.collections().unwrap(), vec!["fresh".to_string()]);
    }

    #[test]
    fn collections_are_isolated() {
        let store = MemoryStore::new();
        let id = store.insert("a", doc("x")).unwrap();

        assert_eq!(store.find("b", id).unwrap(), None);
        assert_eq!(store.last_modified("b").unwrap(), 0);
        assert_eq!(store.collections().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn invalid_collection_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.insert("", doc("x")),
            Err(StoreError::InvalidCollection(_))
        ));
        assert!(matches!(
            store.find_all("a/b"),
            Err(StoreError::InvalidCollection(_))
        ));
    }

    #[test]
    fn concurrent_inserts_get_unique_ids() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|i| store.insert("todos", Document::new().with("i", i)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id));
            }
        }
        assert_eq!(store.count("todos").unwrap(), 800);
    }

    #[test]
    fn marked_reads_agree_with_plain_reads() {
        let (store, clock) = store_at(1_000);
        let a = store.insert("todos", doc("a")).unwrap();
        clock.advance(5);
        store.insert("todos", doc("b")).unwrap();

        let all = store.find_all_with_mark("todos").unwrap();
        assert_eq!(all.value.len(), 2);
        assert_eq!(all.last_modified, store.last_modified("todos").unwrap());

        let by_ids = store.find_by_ids_with_mark("todos", &[a, a]).unwrap();
        assert_eq!(by_ids.value.len(), 1);

        let since = store.find_since_with_mark("todos", 1_000).unwrap();
        assert_eq!(since.value.len(), 1);
        assert_eq!(since.last_modified, 1_005);
    }

    #[test]
    fn marked_read_of_unknown_collection() {
        let store = MemoryStore::new();
        let read = store.find_since_with_mark("todos", 0).unwrap();
        assert!(read.value.is_empty());
        assert_eq!(read.last_modified, 0);
    }

    #[test]
    fn marked_checkpoints_never_skip_concurrent_writes() {
        let store = Arc::new(MemoryStore::new());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..500 {
                    store.insert("todos", Document::new().with("i", i)).unwrap();
                }
            })
        };

        let mut seen = HashSet::new();
        let mut mark = 0;
        loop {
            let finished = writer.is_finished();
            let read = store.find_since_with_mark("todos", mark).unwrap();
            for stored in &read.value {
                assert!(stored.modified <= read.last_modified);
                seen.insert(stored.document.id().unwrap());
            }
            mark = read.last_modified;
            if finished {
                break;
            }
        }
        writer.join().unwrap();
        assert_eq!(seen.len(), 500);
    }
}
