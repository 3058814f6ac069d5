//! Tally Record API server
//!
//! Serves the order endpoints over the shared SQLite database.

use std::env;
use std::process;
use tally_api::{config::ApiConfig, start_server, ServerError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        ApiConfig::from_file(&args[2])?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, using defaults (127.0.0.1:9000, ./tally.db)");
        eprintln!("Usage: tally-api --config <path-to-config.toml>");
        eprintln!();
        ApiConfig::default()
    };

    start_server(config).await
}

fn print_help() {
    println!("Tally Record API - HTTP interface over stored orders");
    println!();
    println!("USAGE:");
    println!("    tally-api --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file may contain:");
    println!("    - bind_address: IP address to bind (default: '127.0.0.1')");
    println!("    - bind_port: Port number (default: 9000)");
    println!("    - database_path: SQLite database file (default: 'tally.db')");
    println!();
    println!("    Log verbosity is controlled with RUST_LOG (default: info).");
    println!();
}
