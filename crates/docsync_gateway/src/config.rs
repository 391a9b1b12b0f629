//! Gateway configuration.

use crate::error::{GatewayError, GatewayResult};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Configuration for the sync gateway.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// wants to change:
///
/// ```json
/// { "bind_addr": "0.0.0.0:9000", "object_root": "objects" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// First path segment of every protocol request.
    pub object_root: String,
    /// Response header carrying the collection's last-modified stamp.
    pub modified_header: String,
    /// Maximum number of documents in one PUT or POST body.
    pub max_batch_documents: usize,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl GatewayConfig {
    /// Creates a new gateway configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            object_root: "object".to_string(),
            modified_header: "X-Last-Modified".to_string(),
            max_batch_documents: 1000,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON or
    /// fails [`GatewayConfig::validate`].
    pub fn from_json_file(path: &Path) -> GatewayResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| GatewayError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Sets the object root path segment.
    pub fn with_object_root(mut self, root: impl Into<String>) -> Self {
        self.object_root = root.into();
        self
    }

    /// Sets the last-modified header name.
    pub fn with_modified_header(mut self, name: impl Into<String>) -> Self {
        self.modified_header = name.into();
        self
    }

    /// Sets the maximum number of documents per write request.
    pub fn with_max_batch_documents(mut self, max: usize) -> Self {
        self.max_batch_documents = max;
        self
    }

    /// Sets the maximum request body size.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Checks that the configuration can be served.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] describing the first bad field.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.object_root.is_empty() || self.object_root.contains('/') {
            return Err(GatewayError::Config(format!(
                "object_root must be a single path segment, got {:?}",
                self.object_root
            )));
        }
        if axum::http::HeaderName::from_bytes(self.modified_header.as_bytes()).is_err() {
            return Err(GatewayError::Config(format!(
                "modified_header is not a valid header name: {:?}",
                self.modified_header
            )));
        }
        if self.max_batch_documents == 0 {
            return Err(GatewayError::Config(
                "max_batch_documents must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8080)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.object_root, "object");
        assert_eq!(config.modified_header, "X-Last-Modified");
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_builder() {
        let config = GatewayConfig::new("0.0.0.0:9000".parse().unwrap())
            .with_object_root("objects")
            .with_modified_header("X-Mtime")
            .with_max_batch_documents(10)
            .with_max_body_bytes(1024);

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.object_root, "objects");
        assert_eq!(config.modified_header, "X-Mtime");
        assert_eq!(config.max_batch_documents, 10);
        assert_eq!(config.max_body_bytes, 1024);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{ "bind_addr": "0.0.0.0:9000" }"#).unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.object_root, "object");
        assert_eq!(config.max_batch_documents, 1000);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(GatewayConfig::default()
            .with_object_root("a/b")
            .validate()
            .is_err());
        assert!(GatewayConfig::default()
            .with_modified_header("bad header")
            .validate()
            .is_err());
        assert!(GatewayConfig::default()
            .with_max_batch_documents(0)
            .validate()
            .is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = GatewayConfig::from_json_file(Path::new("/nonexistent/docsync.json")).unwrap_err();
        assert!(matches!(err, GatewayError::Io(_)));
    }
}
