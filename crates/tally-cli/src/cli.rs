//! CLI command definitions and argument parsing.

use crate::config::{Config, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tally - Turn invoice documents into order records and query them in plain English.
#[derive(Debug, Parser)]
#[command(name = "tally")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.tally/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ollama endpoint
    #[arg(long, env = "OLLAMA_HOST", global = true)]
    pub ollama_host: Option<String>,

    /// Model used for extraction and chat
    #[arg(long, env = "TALLY_MODEL", global = true)]
    pub model: Option<String>,

    /// SQLite database path
    #[arg(long, env = "TALLY_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Record API base URL used by `ask` and `chat`
    #[arg(long, env = "TALLY_API_URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply flag and environment overrides on top of `config`
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(host) = &self.ollama_host {
            config.ollama_endpoint = host.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(db) = &self.db {
            config.database_path = db.clone();
        }
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract invoice documents and store them as orders
    Ingest(IngestArgs),

    /// Ask one question about the stored orders
    Ask(AskArgs),

    /// Enter the interactive chat (default)
    Chat,

    /// Regenerate the CSV export of both tables
    Export(ExportArgs),

    /// List stored orders
    Orders,
}

/// Arguments for the ingest command.
#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// Documents to ingest (PDF, image or plain text), processed in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Directory to regenerate the CSV export in after each commit
    #[arg(short, long)]
    pub export_dir: Option<PathBuf>,

    /// Skip the CSV export
    #[arg(long, conflicts_with = "export_dir")]
    pub no_export: bool,
}

/// Arguments for the ask command.
#[derive(Debug, Parser)]
pub struct AskArgs {
    /// The question, e.g. "show me order A100"
    #[arg(required = true, trailing_var_arg = true)]
    pub query: Vec<String>,
}

impl AskArgs {
    /// The question as one string
    pub fn text(&self) -> String {
        self.query.join(" ")
    }
}

/// Arguments for the export command.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    /// Output directory (default: the configured export directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}
