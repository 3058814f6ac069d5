//! Tally CLI - Ingest invoices and query the resulting orders.

use clap::Parser;
use tally_cli::commands;
use tally_cli::repl;
use tally_cli::{Cli, Command, Config, Formatter};
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
        std::process::exit(1);
    }
}

async fn run() -> tally_cli::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        None | Some(Command::Chat) => repl::run_chat(&config, &formatter).await?,
        Some(Command::Ingest(args)) => commands::execute_ingest(args, &config, &formatter).await?,
        Some(Command::Ask(args)) => commands::execute_ask(args, &config, &formatter).await?,
        Some(Command::Export(args)) => commands::execute_export(args, &config, &formatter).await?,
        Some(Command::Orders) => commands::execute_orders(&config, &formatter).await?,
    }

    Ok(())
}
