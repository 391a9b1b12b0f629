//! Main sync server.

use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::handler::SyncGateway;
use crate::http;
use docsync_store::DocumentStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// The sync server.
///
/// Binds the configured address and serves a [`SyncGateway`] over HTTP
/// until the shutdown future resolves.
///
/// # Example
///
/// ```no_run
/// use docsync_gateway::{GatewayConfig, SyncServer};
/// use docsync_store::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn run() -> docsync_gateway::GatewayResult<()> {
/// let server = SyncServer::new(GatewayConfig::default(), Arc::new(MemoryStore::new()))?;
/// server.run(async { let _ = tokio::signal::ctrl_c().await; }).await
/// # }
/// ```
pub struct SyncServer {
    gateway: SyncGateway,
}

impl SyncServer {
    /// Creates a server after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`](crate::GatewayError::Config) for an
    /// invalid configuration.
    pub fn new(config: GatewayConfig, store: Arc<dyn DocumentStore>) -> GatewayResult<Self> {
        config.validate()?;
        Ok(Self {
            gateway: SyncGateway::new(config, store),
        })
    }

    /// Returns the gateway served by this server.
    pub fn gateway(&self) -> &SyncGateway {
        &self.gateway
    }

    /// Binds the configured address and serves until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Io`](crate::GatewayError::Io) if the address
    /// cannot be bound or the listener fails.
    pub async fn run<F>(self, shutdown: F) -> GatewayResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.gateway.config().bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` completes.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> GatewayResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr: SocketAddr = listener.local_addr()?;
        let config = self.gateway.config();
        info!(
            addr = %local_addr,
            root = %config.object_root,
            header = %config.modified_header,
            "sync gateway listening"
        );

        let app = http::router(self.gateway)?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("sync gateway stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_store::MemoryStore;

    #[test]
    fn rejects_invalid_config() {
        let config = GatewayConfig::default().with_object_root("");
        assert!(SyncServer::new(config, Arc::new(MemoryStore::new())).is_err());
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = SyncServer::new(GatewayConfig::default(), Arc::new(MemoryStore::new())).unwrap();

        server.serve(listener, async {}).await.unwrap();
    }
}
