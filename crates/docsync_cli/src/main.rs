//! DocSync CLI
//!
//! Command-line entry point for the DocSync gateway.
//!
//! # Commands
//!
//! - `serve` - Run the sync gateway over an in-memory store
//! - `version` - Show version information

use clap::{Parser, Subcommand};
use docsync_gateway::{GatewayConfig, SyncServer};
use docsync_store::MemoryStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// DocSync delta-sync gateway.
#[derive(Parser)]
#[command(name = "docsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync gateway
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// First path segment of every sync request
        #[arg(short, long)]
        root: Option<String>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve { bind, root, config } => {
            let mut config = match config {
                Some(path) => GatewayConfig::from_json_file(&path)?,
                None => GatewayConfig::default(),
            };
            if let Some(addr) = bind {
                config = config.with_bind_addr(addr);
            }
            if let Some(root) = root {
                config = config.with_object_root(root);
            }

            info!(version = docsync_gateway::VERSION, "starting docsync");
            let server = SyncServer::new(config, Arc::new(MemoryStore::new()))?;
            server.run(shutdown_signal()).await?;
        }
        Commands::Version => {
            println!("DocSync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("DocSync Gateway v{}", docsync_gateway::VERSION);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::parse_from([
            "docsync", "-v", "serve", "--bind", "0.0.0.0:9000", "--root", "objects",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve { bind, root, config } => {
                assert_eq!(bind, Some("0.0.0.0:9000".parse().unwrap()));
                assert_eq!(root.as_deref(), Some("objects"));
                assert!(config.is_none());
            }
            Commands::Version => panic!("expected serve"),
        }
    }
}
