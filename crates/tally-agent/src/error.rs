//! Error types for the tool-call loop

use serde_json::{json, Value};
use thiserror::Error;

/// Errors that can occur while planning a tool call
///
/// Every variant that stems from a completion keeps the raw text, so it can be
/// shown to the user when no call can be made.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// The planned method is not GET, POST, PATCH or DELETE
    #[error("Unsupported method: {method}")]
    UnsupportedMethod {
        /// The method as planned
        method: String,
        /// The completion exactly as received
        raw: String,
    },

    /// The planned URL is not one of the permitted endpoints
    #[error("Disallowed endpoint: {url}")]
    DisallowedEndpoint {
        /// The URL as planned
        url: String,
        /// The completion exactly as received
        raw: String,
    },

    /// The completion is not a tool-call object
    #[error("Malformed tool call: {reason}")]
    MalformedResponse {
        /// What was wrong with it
        reason: String,
        /// The completion exactly as received
        raw: String,
    },

    /// Completion provider error
    #[error("Completion error: {0}")]
    Completion(String),

    /// The completion did not arrive in time
    #[error("Planning timed out after {0}s")]
    Timeout(u64),
}

impl PlanError {
    /// Raw completion text, for errors that carry one
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            PlanError::UnsupportedMethod { raw, .. }
            | PlanError::DisallowedEndpoint { raw, .. }
            | PlanError::MalformedResponse { raw, .. } => Some(raw),
            PlanError::Completion(_) | PlanError::Timeout(_) => None,
        }
    }
}

/// Errors that can occur while calling the Record API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Non-2xx response, unusable body, or transport failure
    ///
    /// `status` is absent when no response was received.
    #[error("Remote error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    RemoteError {
        /// HTTP status code, if a response arrived
        status: Option<u16>,
        /// Server detail or transport error
        message: String,
    },

    /// The request did not complete in time
    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

impl ExecutionError {
    /// HTTP status code, if a response arrived
    pub fn status(&self) -> Option<u16> {
        match self {
            ExecutionError::RemoteError { status, .. } => *status,
            ExecutionError::Timeout(_) => None,
        }
    }

    /// Render as a JSON object so the failure can still be narrated
    pub fn to_json(&self) -> Value {
        match self {
            ExecutionError::RemoteError { status, message } => {
                json!({ "error": message, "status": status })
            }
            ExecutionError::Timeout(secs) => {
                json!({ "error": format!("request timed out after {}s", secs), "status": null })
            }
        }
    }
}

/// Errors that can occur while narrating a response
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// Completion provider error
    #[error("Completion error: {0}")]
    Completion(String),

    /// The completion did not arrive in time
    #[error("Synthesis timed out after {0}s")]
    Timeout(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = ExecutionError::RemoteError {
            status: Some(404),
            message: "Order not found".to_string(),
        };
        assert_eq!(err.to_string(), "Remote error (404): Order not found");

        let err = ExecutionError::RemoteError {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Remote error: connection refused");
    }

    #[test]
    fn test_remote_error_json() {
        let err = ExecutionError::RemoteError {
            status: Some(400),
            message: "Order already exists".to_string(),
        };
        assert_eq!(
            err.to_json(),
            json!({"error": "Order already exists", "status": 400})
        );
        assert_eq!(ExecutionError::Timeout(5).to_json()["status"], Value::Null);
    }

    #[test]
    fn test_raw_output() {
        let err = PlanError::DisallowedEndpoint {
            url: "/orders.csv".to_string(),
            raw: "{...}".to_string(),
        };
        assert_eq!(err.raw_output(), Some("{...}"));
        assert_eq!(PlanError::Timeout(3).raw_output(), None);
    }
}
