//! Test fixtures and gateway helpers.
//!
//! Provides convenience functions for setting up stores, gateways
//! and common test scenarios.

use docsync_codec::{encode_many, Document, ObjectId, Value};
use docsync_gateway::{GatewayConfig, SyncGateway};
use docsync_store::{DocumentStore, ManualClock, MemoryStore, Timestamp};
use std::sync::Arc;

/// Clock value every fixture clock starts at.
pub const FIXTURE_EPOCH: Timestamp = 1_700_000_000_000;

/// A gateway over an in-memory store with a controllable clock.
pub struct TestGateway {
    /// The gateway under test.
    pub gateway: SyncGateway,
    /// The store behind the gateway.
    pub store: Arc<MemoryStore>,
    /// The store's clock.
    pub clock: Arc<ManualClock>,
}

impl TestGateway {
    /// Creates a test gateway with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GatewayConfig::default())
    }

    /// Creates a test gateway with `config`.
    pub fn with_config(config: GatewayConfig) -> Self {
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let gateway = SyncGateway::new(config, store.clone());
        Self {
            gateway,
            store,
            clock,
        }
    }

    /// Returns the request path for `collection`, with optional suffix segments.
    pub fn path(&self, collection: &str, suffix: &[&str]) -> String {
        let mut path = format!("/{}/{}", self.gateway.config().object_root, collection);
        for segment in suffix {
            path.push('/');
            path.push_str(segment);
        }
        path
    }
}

impl Default for TestGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestGateway {
    type Target = SyncGateway;

    fn deref(&self) -> &Self::Target {
        &self.gateway
    }
}

/// Creates a gateway over a fresh in-memory store.
pub fn gateway_with_memory_store() -> TestGateway {
    TestGateway::new()
}

/// Builds a small document resembling a to-do entry.
pub fn sample_document(index: usize) -> Document {
    Document::new()
        .with("title", format!("task {index}"))
        .with("done", index % 2 == 0)
        .with("priority", index as i64)
        .with("tags", vec![Value::from("sync"), Value::from("test")])
}

/// Builds `count` sample documents.
pub fn sample_documents(count: usize) -> Vec<Document> {
    (0..count).map(sample_document).collect()
}

/// Encodes documents into a request body.
pub fn request_body(documents: &[Document]) -> Vec<u8> {
    encode_many(documents).expect("Failed to encode documents")
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a gateway whose `collection` already holds `count` documents.
    ///
    /// The clock advances by one millisecond between inserts.
    pub fn populated_gateway(collection: &str, count: usize) -> (TestGateway, Vec<ObjectId>) {
        let test = TestGateway::new();
        let mut ids = Vec::with_capacity(count);

        for document in sample_documents(count) {
            let id = test
                .store
                .insert(collection, document)
                .expect("Failed to insert document");
            ids.push(id);
            test.clock.advance(1);
        }

        (test, ids)
    }
}
