//! Narration of tool responses

use crate::error::SynthesisError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tally_domain::CompletionProvider;
use tokio::time::timeout;
use tracing::debug;

/// Build the narration prompt for a tool response
pub fn build_synthesis_prompt(query: &str, response: &Value) -> String {
    let data = serde_json::to_string_pretty(response).unwrap_or_else(|_| response.to_string());
    format!(
        "You are a helpful assistant. Here is the result of a database tool call:\n\n\
         {}\n\n\
         Now, please answer the user's original query:\n\
         {}\n\n\
         Be precise, avoid guessing, and base your answer only on the data above.",
        data, query
    )
}

/// Answers the user's query from a tool response
pub struct Synthesizer<L: CompletionProvider> {
    llm: Arc<L>,
    timeout: Duration,
}

impl<L: CompletionProvider> Synthesizer<L> {
    /// Create a synthesizer
    pub fn new(llm: Arc<L>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Narrate `response` as an answer to `query`; the completion is returned verbatim
    pub async fn synthesize(&self, query: &str, response: &Value) -> Result<String, SynthesisError> {
        let prompt = build_synthesis_prompt(query, response);
        debug!("Synthesis prompt length: {} chars", prompt.len());

        timeout(self.timeout, self.llm.complete(&prompt))
            .await
            .map_err(|_| SynthesisError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| SynthesisError::Completion(e.to_string()))
    }
}
