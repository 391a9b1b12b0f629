//! # DocSync Store
//!
//! The document store contract behind the sync gateway.
//!
//! The gateway only talks to storage through [`DocumentStore`]. Real
//! deployments plug in their own persistence engine; this crate ships the
//! trait and an in-memory reference implementation.
//!
//! ## Delta Sync Stamps
//!
//! Every insert, update and delete issues a per-collection stamp
//! (milliseconds since the epoch). Stamps strictly increase within a
//! collection even when the wall clock stalls or moves backwards, so a
//! client holding the collection's `last_modified` value can ask for
//! "everything after X" and never miss a write.
//!
//! ## Example
//!
//! ```rust
//! use docsync_codec::Document;
//! use docsync_store::{DocumentStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let mark = store.last_modified("todos").unwrap();
//! store.insert("todos", Document::new().with("title", "milk")).unwrap();
//!
//! let changed = store.find_since("todos", mark).unwrap();
//! assert_eq!(changed.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod error;
mod memory;
mod store;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{validate_collection, DocumentStore, Marked, StoredDocument};
