//! # DocSync Gateway
//!
//! HTTP delta-sync gateway over a [`docsync_store::DocumentStore`].
//!
//! This crate provides:
//! - Request routing below a configurable object root
//! - Per-verb handlers (save, update, list, delta, id lookup, delete)
//! - An axum binding and a server with graceful shutdown
//!
//! # Protocol
//!
//! Bodies are concatenated binary document frames. Every read carries the
//! collection's last-modified stamp in a response header, so a client can
//! pull changes incrementally:
//! 1. `GET /object/{collection}` once, remembering the header value
//! 2. `GET /object/{collection}/mtime/{stamp}` to fetch later changes
//! 3. `PUT` new documents and `POST` edited ones
//!
//! Deletions are not reported by the delta query. They only advance the
//! last-modified stamp.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod http;
mod request;
mod server;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult, MISSING_ID_BODY};
pub use handler::{GatewayResponse, ResponseBody, SyncGateway};
pub use http::router;
pub use request::{SyncRequest, MTIME_SEGMENT};
pub use server::SyncServer;

/// Gateway crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
