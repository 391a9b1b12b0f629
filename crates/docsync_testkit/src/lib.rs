//! # DocSync Testkit
//!
//! Test utilities for DocSync.
//!
//! This crate provides:
//! - Gateway fixtures over an in-memory store with a manual clock
//! - Property-based test generators using proptest
//! - A store double that fails on demand
//! - Fuzz testing harnesses
//! - Concurrent stress helpers
//!
//! ## Usage
//!
//! ```
//! use docsync_testkit::prelude::*;
//! use axum::http::{Method, StatusCode};
//!
//! let test = gateway_with_memory_store();
//! let body = request_body(&sample_documents(2));
//! let response = test.handle(&Method::PUT, &test.path("todos", &[]), &body);
//! assert_eq!(response.status, StatusCode::OK);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod doubles;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::doubles::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use doubles::*;
pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use stress::*;
