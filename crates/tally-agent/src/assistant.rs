//! The chat loop: plan, execute, narrate

use crate::config::AgentConfig;
use crate::error::PlanError;
use crate::executor::Executor;
use crate::planner::Planner;
use crate::synthesizer::Synthesizer;
use crate::tool::ToolCall;
use serde_json::Value;
use std::sync::Arc;
use tally_domain::CompletionProvider;
use tracing::{info, info_span, warn, Instrument};

/// How a chat turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// The call succeeded and the result was narrated
    Answered,
    /// No call was made; the answer is the planner's raw output or the reason
    PlanRejected {
        /// Why the plan was rejected
        reason: String,
    },
    /// The call failed; the error was narrated in place of a result
    RemoteFailed {
        /// HTTP status, if a response arrived
        status: Option<u16>,
    },
    /// The call succeeded but narration failed; the answer is the raw result
    NarrationFailed {
        /// Why narration failed
        reason: String,
    },
}

/// Result of one chat turn
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    /// Text to show the user
    pub answer: String,
    /// The validated call, if planning succeeded
    pub tool_call: Option<ToolCall>,
    /// The API result, or the rendered error if the call failed
    pub tool_response: Option<Value>,
    /// How the turn ended
    pub outcome: ReplyOutcome,
}

/// Natural-language front end to the Record API
///
/// One completion provider is shared by the planner and the synthesizer.
pub struct Assistant<L: CompletionProvider> {
    planner: Planner<L>,
    executor: Executor,
    synthesizer: Synthesizer<L>,
}

impl<L: CompletionProvider> Assistant<L> {
    /// Create an assistant; fails if `config` is invalid
    pub fn new(llm: L, config: &AgentConfig) -> Result<Self, String> {
        config.validate()?;
        let base = config.base_url()?;
        let llm = Arc::new(llm);

        Ok(Self {
            planner: Planner::new(Arc::clone(&llm), base, config.plan_timeout()),
            executor: Executor::new(config.request_timeout()),
            synthesizer: Synthesizer::new(llm, config.synthesis_timeout()),
        })
    }

    /// The planner in use
    pub fn planner(&self) -> &Planner<L> {
        &self.planner
    }

    /// Answer one user request
    ///
    /// Never fails: every error becomes a [`ReplyOutcome`] with a fallback
    /// answer.
    pub async fn ask(&self, query: &str) -> ChatReply {
        let span = info_span!("chat", query_len = query.len());
        self.ask_inner(query).instrument(span).await
    }

    async fn ask_inner(&self, query: &str) -> ChatReply {
        let call = match self.planner.plan(query).await {
            Ok(call) => call,
            Err(e) => return plan_rejected(e),
        };

        let (response, remote_status) = match self.executor.execute(&call).await {
            Ok(value) => (value, None),
            Err(e) => {
                warn!("Tool call failed: {}", e);
                (e.to_json(), Some(e.status()))
            }
        };

        let answer = self.synthesizer.synthesize(query, &response).await;
        let (answer, outcome) = match (answer, remote_status) {
            (Ok(text), None) => (text, ReplyOutcome::Answered),
            (Ok(text), Some(status)) => (text, ReplyOutcome::RemoteFailed { status }),
            (Err(e), None) => {
                warn!("Narration failed: {}", e);
                let raw = serde_json::to_string_pretty(&response)
                    .unwrap_or_else(|_| response.to_string());
                (
                    raw,
                    ReplyOutcome::NarrationFailed {
                        reason: e.to_string(),
                    },
                )
            }
            (Err(e), Some(status)) => {
                warn!("Narration failed: {}", e);
                let message = response["error"].as_str().unwrap_or("unknown error");
                (
                    format!("The request failed: {}", message),
                    ReplyOutcome::RemoteFailed { status },
                )
            }
        };

        info!("Chat turn finished: {:?}", outcome);
        ChatReply {
            answer,
            tool_call: Some(call),
            tool_response: Some(response),
            outcome,
        }
    }
}

fn plan_rejected(e: PlanError) -> ChatReply {
    let answer = match e.raw_output() {
        Some(raw) => raw.to_string(),
        None => format!("I couldn't work out which request to make: {}", e),
    };
    ChatReply {
        answer,
        tool_call: None,
        tool_response: None,
        outcome: ReplyOutcome::PlanRejected {
            reason: e.to_string(),
        },
    }
}
