//! Ask command implementation.

use crate::cli::AskArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use tally_agent::Assistant;
use tally_llm::OllamaProvider;

/// Build the chat assistant described by `config`.
pub fn build_assistant(config: &Config) -> Result<Assistant<OllamaProvider>> {
    Assistant::new(super::completion_provider(config), &config.agent_config())
        .map_err(CliError::Config)
}

/// Execute the ask command.
pub async fn execute_ask(args: AskArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let query = args.text();
    if query.trim().is_empty() {
        return Err(CliError::InvalidInput("Query must not be empty".to_string()));
    }

    let assistant = build_assistant(config)?;
    let reply = assistant.ask(query.trim()).await;
    println!("{}", formatter.format_reply(&reply)?);
    Ok(())
}
