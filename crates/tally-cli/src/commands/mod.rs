//! Command implementations.

pub mod ask;
pub mod export;
pub mod ingest;
pub mod orders;

pub use self::ask::{build_assistant, execute_ask};
pub use self::export::execute_export;
pub use self::ingest::execute_ingest;
pub use self::orders::execute_orders;

use crate::config::Config;
use crate::error::Result;
use tally_llm::OllamaProvider;
use tally_store::SqliteStore;
use tracing::debug;

/// The completion provider described by `config`.
pub fn completion_provider(config: &Config) -> OllamaProvider {
    debug!("Using model {} at {}", config.model, config.ollama_endpoint);
    OllamaProvider::new(config.ollama_endpoint.clone(), config.model.clone())
        .with_timeout(config.completion_timeout())
}

/// Open the configured record store.
pub fn open_store(config: &Config) -> Result<SqliteStore> {
    Ok(SqliteStore::new(&config.database_path)?)
}
