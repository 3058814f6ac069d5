//! Natural-language request to tool call
//!
//! The model is shown the five endpoints and asked for a single JSON object.
//! Whatever it answers is checked by [`parse_tool_call`], a pure function:
//! the method must be supported, the URL must resolve under the API base to
//! one of the permitted shapes, and the method must fit that shape.

use crate::error::PlanError;
use crate::tool::{Endpoint, Method, ToolCall};
use percent_encoding::percent_decode_str;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tally_domain::CompletionProvider;
use tally_llm::strip_code_fence;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Build the planning prompt for `query`
pub fn build_plan_prompt(base: &Url, query: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    format!(
        r#"You are a data analysis assistant with access to an order records API.

Available endpoints (you must choose one of these):
GET     {base}/orders
GET     {base}/order/{{order_id}}
POST    {base}/order
PATCH   {base}/order/{{order_id}}
DELETE  {base}/order/{{order_id}}

When the user asks a question, respond ONLY with a tool-call JSON like:

{{
  "method": "GET",
  "url": "{base}/orders"
}}

For POST and PATCH, add a "payload" object with the order fields to set
(order_id, customer_name, email, phone, total_qty, subtotal, vat, grand_total).

Do NOT include .csv or made-up endpoints.

User query: {query}"#,
        base = base,
        query = query
    )
}

/// Validate a planning completion and turn it into a [`ToolCall`]
///
/// - `method` is required and must be GET, POST, PATCH or DELETE in any case
/// - `url` is required; it may be absolute (same scheme, host and port as
///   `base`) or a path starting with `/`, and must name one of the five
///   endpoints exactly, with no query string or fragment
/// - `payload`, if present and not null, must be an object
pub fn parse_tool_call(response: &str, base: &Url) -> Result<ToolCall, PlanError> {
    let raw = || response.to_string();
    let malformed = |reason: &str| PlanError::MalformedResponse {
        reason: reason.to_string(),
        raw: raw(),
    };

    let json: Value = serde_json::from_str(strip_code_fence(response))
        .map_err(|e| malformed(&format!("JSON parse error: {}", e)))?;
    let obj = json
        .as_object()
        .ok_or_else(|| malformed("Expected a JSON object"))?;

    let method = match obj.get("method") {
        None | Some(Value::Null) => return Err(malformed("Missing 'method'")),
        Some(Value::String(s)) => s.parse::<Method>().map_err(|_| PlanError::UnsupportedMethod {
            method: s.clone(),
            raw: raw(),
        })?,
        Some(other) => {
            return Err(PlanError::UnsupportedMethod {
                method: other.to_string(),
                raw: raw(),
            })
        }
    };

    let url = match obj.get("url") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim(),
        _ => return Err(malformed("Missing 'url'")),
    };
    let disallowed = || PlanError::DisallowedEndpoint {
        url: url.to_string(),
        raw: raw(),
    };

    let endpoint = resolve_endpoint(method, url, base).ok_or_else(disallowed)?;

    let payload = match obj.get("payload") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => return Err(malformed("'payload' must be a JSON object")),
    };

    Ok(ToolCall::new(base, endpoint, payload))
}

/// Map a planned URL onto an endpoint under `base`
fn resolve_endpoint(method: Method, url: &str, base: &Url) -> Option<Endpoint> {
    let candidate = if url.starts_with('/') {
        Url::parse(&format!("{}{}", base.as_str().trim_end_matches('/'), url)).ok()?
    } else {
        Url::parse(url).ok()?
    };

    if candidate.origin() != base.origin()
        || !candidate.username().is_empty()
        || candidate.password().is_some()
        || candidate.query().is_some()
        || candidate.fragment().is_some()
    {
        return None;
    }

    let base_segments: Vec<&str> = base
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();
    let segments: Vec<&str> = candidate.path_segments()?.collect();

    let rest = segments.strip_prefix(base_segments.as_slice())?;
    let owned = rest
        .iter()
        .map(|segment| percent_decode_str(segment).decode_utf8().ok())
        .collect::<Option<Vec<_>>>()?;
    let decoded: Vec<&str> = owned.iter().map(|segment| segment.as_ref()).collect();
    Endpoint::from_parts(method, &decoded)
}

/// Turns user requests into validated tool calls
pub struct Planner<L: CompletionProvider> {
    llm: Arc<L>,
    base: Url,
    timeout: Duration,
}

impl<L: CompletionProvider> Planner<L> {
    /// Create a planner for the API at `base`
    pub fn new(llm: Arc<L>, base: Url, timeout: Duration) -> Self {
        Self { llm, base, timeout }
    }

    /// The API base calls are planned against
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Plan one Record API call for `query`
    pub async fn plan(&self, query: &str) -> Result<ToolCall, PlanError> {
        let prompt = build_plan_prompt(&self.base, query);
        debug!("Plan prompt length: {} chars", prompt.len());

        let response = timeout(self.timeout, self.llm.complete(&prompt))
            .await
            .map_err(|_| PlanError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| PlanError::Completion(e.to_string()))?;

        debug!("Raw tool call: {}", response);

        match parse_tool_call(&response, &self.base) {
            Ok(call) => {
                info!("Planned tool call: {}", call);
                Ok(call)
            }
            Err(e) => {
                warn!("Rejected tool call: {}", e);
                Err(e)
            }
        }
    }
}
