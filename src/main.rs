//! pcc-server: counts printable characters sent by clients.
//!
//! Serves one connection at a time until SIGINT or SIGTERM arrives while
//! idle, then prints the cumulative histogram to stdout and exits.

use pcc::config::Config;
use pcc::{Server, ServerError, Shutdown};
use std::io::Write;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        backlog = config.backlog,
        chunk_size = config.chunk_size,
        "Starting pcc server"
    );

    let histogram = run(config).map_err(|e| {
        error!(error = %e, "Server failed");
        e
    })?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write!(out, "{histogram}")?;
    out.flush()?;
    Ok(())
}

fn run(config: Config) -> Result<pcc::Histogram, ServerError> {
    let shutdown = Shutdown::install().map_err(ServerError::Signal)?;
    let server = Server::bind(&config)?;
    server.run(shutdown)
}
