//! TableDB - HTTP server
//!
//! # Usage
//!
//! ```bash
//! tabledb-server --data-dir /var/lib/tabledb --port 7171
//! curl -X POST --data "SELECT * FROM users;" http://127.0.0.1:7171/query
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tabledb::server::{Server, ServerConfig, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT};
use tabledb::{Engine, EngineConfig};

/// TableDB HTTP server
#[derive(Parser, Debug)]
#[command(name = "tabledb-server", version, about = "TableDB HTTP server")]
struct Args {
    /// Host address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "TABLEDB_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT, env = "TABLEDB_PORT")]
    port: u16,

    /// Data directory holding the catalog and table documents
    #[arg(short = 'd', long, value_name = "DIR", default_value = "data", env = "TABLEDB_DATA_DIR")]
    data_dir: PathBuf,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "TABLEDB_LOG_LEVEL")]
    log_level: String,
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("tabledb={}", args.log_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let engine = Engine::open(EngineConfig::new().data_dir(&args.data_dir))
        .with_context(|| format!("Failed to open database in {}", args.data_dir.display()))?;
    info!("Data directory: {}", args.data_dir.display());

    let config = ServerConfig::new()
        .host(args.host)
        .port(args.port)
        .max_body_bytes(args.max_body_bytes);
    let server = Server::bind(config.clone(), engine)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;

    tokio::select! {
        result = server.run() => result.context("Server stopped")?,
        _ = signal::ctrl_c() => info!("Shutdown requested"),
    }

    Ok(())
}
