//! pcc-client: sends a file to a pcc server and prints the printable count.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the client
#[derive(Parser, Debug)]
#[command(name = "pcc-client")]
#[command(version)]
#[command(about = "Sends a file to a pcc server and prints its printable count", long_about = None)]
struct ClientArgs {
    /// Server address (e.g., 127.0.0.1)
    host: String,

    /// Server port
    port: u16,

    /// File whose contents are sent
    file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ClientArgs::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let addr = pcc::config::join_host_port(&args.host, args.port);
    let count = pcc::client::count_file(&addr, &args.file)?;

    println!("# of printable characters: {count}");
    Ok(())
}
