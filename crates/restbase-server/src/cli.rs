//! Command-line arguments, logging setup and the top-level run loop.

use crate::server::{bind, serve_until, AppState};
use anyhow::{bail, Context, Result};
use clap::Parser;
use restbase_core::{LogConfig, ResourceRegistry, ServerConfig, SqliteDocumentStore, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "restbase-server")]
#[command(about = "REST document server for manifest-declared resources")]
pub struct Args {
    /// Host to bind to
    #[arg(long, env = "RESTBASE_HOST", default_value = ServerConfig::DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, env = "RESTBASE_PORT", default_value_t = ServerConfig::DEFAULT_PORT)]
    pub port: u16,

    /// Number of runtime worker threads
    #[arg(short, long, env = "RESTBASE_WORKERS", default_value_t = ServerConfig::DEFAULT_WORKERS)]
    pub workers: usize,

    /// Resource manifest (JSON object of resource name -> sample documents)
    #[arg(long, env = "RESOURCES_PATH", default_value = StoreConfig::DEFAULT_RESOURCES_PATH)]
    pub resources: PathBuf,

    /// SQLite database file
    #[arg(long, env = "RESTBASE_DATABASE", default_value_os_t = StoreConfig::default_database_path())]
    pub database: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// Reject settings the runtime cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("--workers must be at least 1");
        }
        Ok(())
    }
}

/// Log filter directive for the given debug flag and `LOGLEVEL` value.
pub fn log_directive(debug: bool, level: Option<&str>) -> &'static str {
    if debug {
        return "debug";
    }
    LogConfig::filter_directive(level.unwrap_or(LogConfig::DEFAULT_LEVEL))
}

/// Install the global tracing subscriber.
pub fn init_logging(debug: bool) {
    let level = std::env::var(LogConfig::LOG_LEVEL_ENV).ok();
    let filter = EnvFilter::new(log_directive(debug, level.as_deref()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();
}

/// Load the manifest, open the store and serve until ctrl-c.
pub async fn run(args: Args) -> Result<()> {
    let registry = ResourceRegistry::load(&args.resources)
        .with_context(|| format!("loading resources from {}", args.resources.display()))?;
    let store = SqliteDocumentStore::open(&args.database)
        .with_context(|| format!("opening database {}", args.database.display()))?;

    for name in registry.names() {
        info!("Serving resource /{}", name);
    }

    let state = Arc::new(AppState::new(Arc::new(store), registry));
    let listener = bind(&args.host, args.port).await?;

    serve_until(listener, state, shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, exiting"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
