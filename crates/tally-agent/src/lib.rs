//! Tally Agent
//!
//! The read/command path: a free-text request becomes one validated call
//! against the Record API, and the result is narrated back.
//!
//! # Architecture
//!
//! ```text
//! query → Planner → ToolCall → Executor → JSON → Synthesizer → answer
//! ```
//!
//! - [`Planner`] asks the completion provider for a tool call and validates
//!   it against the closed set of [`Endpoint`]s. Nothing leaves the process
//!   unless validation passes.
//! - [`Executor`] performs the call once, without retries.
//! - [`Synthesizer`] answers the query strictly from the returned data.
//! - [`Assistant`] ties the three together and never fails: a rejected plan
//!   surfaces the raw planner output, and a failed call is narrated as an
//!   error object.

#![warn(missing_docs)]

mod assistant;
mod config;
mod error;
mod executor;
mod planner;
mod synthesizer;
mod tool;

pub use assistant::{Assistant, ChatReply, ReplyOutcome};
pub use config::AgentConfig;
pub use error::{ExecutionError, PlanError, SynthesisError};
pub use executor::Executor;
pub use planner::{build_plan_prompt, parse_tool_call, Planner};
pub use synthesizer::{build_synthesis_prompt, Synthesizer};
pub use tool::{Endpoint, Method, ToolCall};

/// URL type used for the API base and tool calls
pub use reqwest::Url;
