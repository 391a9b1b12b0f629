//! Store doubles for failure-path tests.

use docsync_codec::{Document, ObjectId};
use docsync_store::{
    Clock, DocumentStore, Marked, MemoryStore, StoreError, StoreResult, StoredDocument, Timestamp,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const NEVER: usize = usize::MAX;

/// A [`MemoryStore`] wrapper that can be told to fail.
///
/// Failures surface as [`StoreError::Unavailable`], the error a real
/// backend reports when its storage is unreachable.
#[derive(Debug)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_write_at: AtomicUsize,
    writes: AtomicUsize,
}

impl FailingStore {
    /// Creates a store that does not fail until told to.
    pub fn new() -> Self {
        Self::wrap(MemoryStore::new())
    }

    /// Creates a store using `clock` for stamps.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::wrap(MemoryStore::with_clock(clock))
    }

    fn wrap(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_write_at: AtomicUsize::new(NEVER),
            writes: AtomicUsize::new(0),
        }
    }

    /// Makes every read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes only the write with zero-based position `n` fail, counted from now.
    pub fn fail_nth_write(&self, n: usize) {
        self.writes.store(0, Ordering::SeqCst);
        self.fail_write_at.store(n, Ordering::SeqCst);
    }

    /// Returns the underlying store, bypassing failure injection.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        let position = self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst)
            || position == self.fail_write_at.load(Ordering::SeqCst)
        {
            return Err(StoreError::Unavailable(format!(
                "injected failure on write {position}"
            )));
        }
        Ok(())
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for FailingStore {
    fn insert(&self, collection: &str, document: Document) -> StoreResult<ObjectId> {
        self.check_write()?;
        self.inner.insert(collection, document)
    }

    fn upsert(&self, collection: &str, document: Document) -> StoreResult<ObjectId> {
        self.check_write()?;
        self.inner.upsert(collection, document)
    }

    fn update(&self, collection: &str, document: Document) -> StoreResult<()> {
        self.check_write()?;
        self.inner.update(collection, document)
    }

    fn find(&self, collection: &str, id: ObjectId) -> StoreResult<Option<Document>> {
        self.check_read()?;
        self.inner.find(collection, id)
    }

    fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.check_read()?;
        self.inner.find_all(collection)
    }

    fn find_by_ids(&self, collection: &str, ids: &[ObjectId]) -> StoreResult<Vec<Document>> {
        self.check_read()?;
        self.inner.find_by_ids(collection, ids)
    }

    fn find_since(&self, collection: &str, since: Timestamp) -> StoreResult<Vec<StoredDocument>> {
        self.check_read()?;
        self.inner.find_since(collection, since)
    }

    fn find_all_with_mark(&self, collection: &str) -> StoreResult<Marked<Vec<Document>>> {
        self.check_read()?;
        self.inner.find_all_with_mark(collection)
    }

    fn find_by_ids_with_mark(
        &self,
        collection: &str,
        ids: &[ObjectId],
    ) -> StoreResult<Marked<Vec<Document>>> {
        self.check_read()?;
        self.inner.find_by_ids_with_mark(collection, ids)
    }

    fn find_since_with_mark(
        &self,
        collection: &str,
        since: Timestamp,
    ) -> StoreResult<Marked<Vec<StoredDocument>>> {
        self.check_read()?;
        self.inner.find_since_with_mark(collection, since)
    }

    fn delete(&self, collection: &str, id: ObjectId) -> StoreResult<()> {
        self.check_write()?;
        self.inner.delete(collection, id)
    }

    fn last_modified(&self, collection: &str) -> StoreResult<Timestamp> {
        self.check_read()?;
        self.inner.last_modified(collection)
    }

    fn collections(&self) -> StoreResult<Vec<String>> {
        self.check_read()?;
        self.inner.collections()
    }

    fn count(&self, collection: &str) -> StoreResult<usize> {
        self.check_read()?;
        self.inner.count(collection)
    }
}

type ReadHook = Box<dyn FnOnce(&MemoryStore) + Send>;

/// A [`MemoryStore`] wrapper that runs a write between two store calls.
///
/// The armed hook fires once, right after the next document read returns
/// and before the caller makes its next store call. This recreates a
/// concurrent writer landing in the middle of a request.
pub struct InterleavingStore {
    inner: MemoryStore,
    hook: Mutex<Option<ReadHook>>,
}

impl InterleavingStore {
    /// Creates a store using `clock` for stamps.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: MemoryStore::with_clock(clock),
            hook: Mutex::new(None),
        }
    }

    /// Arms `hook` to run after the next document read.
    pub fn after_next_read(&self, hook: impl FnOnce(&MemoryStore) + Send + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }

    /// Returns true while a hook is armed.
    pub fn is_armed(&self) -> bool {
        self.hook.lock().is_some()
    }

    /// Returns the underlying store.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn after_read<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        let hook = self.hook.lock().take();
        if let Some(hook) = hook {
            hook(&self.inner);
        }
        result
    }
}

impl fmt::Debug for InterleavingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterleavingStore")
            .field("inner", &self.inner)
            .field("armed", &self.is_armed())
            .finish()
    }
}

impl DocumentStore for InterleavingStore {
    fn insert(&self, collection: &str, document: Document) -> StoreResult<ObjectId> {
        self.inner.insert(collection, document)
    }

    fn upsert(&self, collection: &str, document: Document) -> StoreResult<ObjectId> {
        self.inner.upsert(collection, document)
    }

    fn update(&self, collection: &str, document: Document) -> StoreResult<()> {
        self.inner.update(collection, document)
    }

    fn find(&self, collection: &str, id: ObjectId) -> StoreResult<Option<Document>> {
        self.inner.find(collection, id)
    }

    fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.after_read(self.inner.find_all(collection))
    }

    fn find_by_ids(&self, collection: &str, ids: &[ObjectId]) -> StoreResult<Vec<Document>> {
        self.after_read(self.inner.find_by_ids(collection, ids))
    }

    fn find_since(&self, collection: &str, since: Timestamp) -> StoreResult<Vec<StoredDocument>> {
        self.after_read(self.inner.find_since(collection, since))
    }

    fn find_all_with_mark(&self, collection: &str) -> StoreResult<Marked<Vec<Document>>> {
        self.after_read(self.inner.find_all_with_mark(collection))
    }

    fn find_by_ids_with_mark(
        &self,
        collection: &str,
        ids: &[ObjectId],
    ) -> StoreResult<Marked<Vec<Document>>> {
        self.after_read(self.inner.find_by_ids_with_mark(collection, ids))
    }

    fn find_since_with_mark(
        &self,
        collection: &str,
        since: Timestamp,
    ) -> StoreResult<Marked<Vec<StoredDocument>>> {
        self.after_read(self.inner.find_since_with_mark(collection, since))
    }

    fn delete(&self, collection: &str, id: ObjectId) -> StoreResult<()> {
        self.inner.delete(collection, id)
    }

    fn last_modified(&self, collection: &str) -> StoreResult<Timestamp> {
        self.inner.last_modified(collection)
    }

    fn collections(&self) -> StoreResult<Vec<String>> {
        self.inner.collections()
    }

    fn count(&self, collection: &str) -> StoreResult<usize> {
        self.inner.count(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_by_default() {
        let store = FailingStore::new();
        let id = store.insert("todos", Document::new().with("a", 1)).unwrap();
        assert!(store.find("todos", id).unwrap().is_some());
    }

    #[test]
    fn injected_read_failure() {
        let store = FailingStore::new();
        store.fail_reads(true);
        assert!(store.find_all("todos").unwrap_err().is_unavailable());
        store.fail_reads(false);
        assert!(store.find_all("todos").is_ok());
    }

    #[test]
    fn nth_write_fails_once() {
        let store = FailingStore::new();
        store.fail_nth_write(1);

        assert!(store.insert("todos", Document::new()).is_ok());
        assert!(store.insert("todos", Document::new()).is_err());
        assert!(store.insert("todos", Document::new()).is_ok());
        assert_eq!(store.inner().count("todos").unwrap(), 2);
    }

    #[test]
    fn marked_reads_fail_with_reads() {
        let store = FailingStore::new();
        store.fail_reads(true);
        assert!(store.find_since_with_mark("todos", 0).is_err());
        assert!(store.find_all_with_mark("todos").is_err());
        assert!(store.find_by_ids_with_mark("todos", &[]).is_err());
    }

    #[test]
    fn hook_runs_once_after_a_document_read() {
        let store = InterleavingStore::with_clock(Arc::new(docsync_store::ManualClock::new(100)));
        store.after_next_read(|inner| {
            inner.insert("todos", Document::new().with("late", true)).unwrap();
        });
        assert!(store.is_armed());

        assert_eq!(store.last_modified("todos").unwrap(), 0);
        assert!(store.is_armed());

        let read = store.find_since_with_mark("todos", 0).unwrap();
        assert!(read.value.is_empty());
        assert_eq!(read.last_modified, 0);
        assert!(!store.is_armed());

        assert_eq!(store.count("todos").unwrap(), 1);
        assert_eq!(store.find_since("todos", 0).unwrap().len(), 1);
        assert_eq!(store.count("todos").unwrap(), 1);
    }
}
