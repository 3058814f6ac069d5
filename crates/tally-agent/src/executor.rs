//! Dispatch of validated tool calls to the Record API

use crate::error::ExecutionError;
use crate::tool::ToolCall;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sends tool calls over HTTP
///
/// Exactly one request is made per call; failures are returned, never
/// retried.
#[derive(Debug, Clone)]
pub struct Executor {
    client: reqwest::Client,
    timeout: Duration,
}

impl Executor {
    /// Create an executor with a per-request timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Perform `call` and return the decoded JSON body
    ///
    /// A successful response with an empty body yields `Value::Null`.
    pub async fn execute(&self, call: &ToolCall) -> Result<Value, ExecutionError> {
        let mut request = self
            .client
            .request(call.method().into(), call.url().clone())
            .timeout(self.timeout);
        if let Some(payload) = call.payload() {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        info!("{} {} -> {}", call.method(), call.url(), status.as_u16());
        debug!("Response body: {}", body);

        if !status.is_success() {
            return Err(ExecutionError::RemoteError {
                status: Some(status.as_u16()),
                message: error_detail(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| ExecutionError::RemoteError {
            status: Some(status.as_u16()),
            message: format!("Response is not JSON: {}", e),
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> ExecutionError {
        if e.is_timeout() {
            warn!("Record API request timed out");
            ExecutionError::Timeout(self.timeout.as_secs())
        } else {
            warn!("Record API request failed: {}", e);
            ExecutionError::RemoteError {
                status: None,
                message: e.to_string(),
            }
        }
    }
}

/// The server's `detail` field, or the trimmed body if there is none
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(detail) => Some(detail.to_string()),
            None => Some(body.to_string()),
        },
        _ => Some(body.to_string()),
    }
}
