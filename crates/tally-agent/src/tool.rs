//! The closed set of Record API operations
//!
//! A [`ToolCall`] can only be built from an [`Endpoint`], and an endpoint can
//! only name one of the five permitted operations. URLs are derived from the
//! endpoint and the configured base, never copied from planner output.

use reqwest::Url;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// HTTP method of a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// True for methods that send a JSON body
    pub fn has_body(&self) -> bool {
        matches!(self, Method::Post | Method::Patch)
    }
}

impl FromStr for Method {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(format!("unsupported method: {}", s)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One of the five permitted Record API operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /orders`
    ListOrders,
    /// `GET /order/{order_id}`
    GetOrder(String),
    /// `POST /order`
    CreateOrder,
    /// `PATCH /order/{order_id}`
    UpdateOrder(String),
    /// `DELETE /order/{order_id}`
    DeleteOrder(String),
}

impl Endpoint {
    /// The method this endpoint is called with
    pub fn method(&self) -> Method {
        match self {
            Endpoint::ListOrders | Endpoint::GetOrder(_) => Method::Get,
            Endpoint::CreateOrder => Method::Post,
            Endpoint::UpdateOrder(_) => Method::Patch,
            Endpoint::DeleteOrder(_) => Method::Delete,
        }
    }

    /// The order this endpoint addresses, if any
    pub fn order_id(&self) -> Option<&str> {
        match self {
            Endpoint::GetOrder(id) | Endpoint::UpdateOrder(id) | Endpoint::DeleteOrder(id) => {
                Some(id)
            }
            Endpoint::ListOrders | Endpoint::CreateOrder => None,
        }
    }

    /// Path segments below the API base
    fn segments(&self) -> Vec<&str> {
        match self {
            Endpoint::ListOrders => vec!["orders"],
            Endpoint::CreateOrder => vec!["order"],
            Endpoint::GetOrder(id) | Endpoint::UpdateOrder(id) | Endpoint::DeleteOrder(id) => {
                vec!["order", id]
            }
        }
    }

    /// Match a method and path (relative to the API base) to an endpoint
    ///
    /// `segments` are percent-decoded.
    ///
    /// Returns `None` for any combination outside the five permitted shapes,
    /// including a known path called with the wrong method.
    pub fn from_parts(method: Method, segments: &[&str]) -> Option<Self> {
        match (method, segments) {
            (Method::Get, ["orders"]) => Some(Endpoint::ListOrders),
            (Method::Post, ["order"]) => Some(Endpoint::CreateOrder),
            (method, ["order", id]) if is_valid_order_id(id) => {
                let id = id.to_string();
                match method {
                    Method::Get => Some(Endpoint::GetOrder(id)),
                    Method::Patch => Some(Endpoint::UpdateOrder(id)),
                    Method::Delete => Some(Endpoint::DeleteOrder(id)),
                    Method::Post => None,
                }
            }
            _ => None,
        }
    }
}

/// Order ids are opaque; only ids that cannot address anything but one order
/// are refused
fn is_valid_order_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains('/')
        && !id.chars().any(char::is_control)
        && !id.to_ascii_lowercase().ends_with(".csv")
}

/// A validated Record API call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    endpoint: Endpoint,
    url: Url,
    payload: Option<Map<String, Value>>,
}

impl ToolCall {
    /// Build the call for `endpoint` under `base`
    ///
    /// Calls with a body always carry one (an empty object if `payload` is
    /// `None`); calls without a body drop any payload given.
    pub fn new(base: &Url, endpoint: Endpoint, payload: Option<Map<String, Value>>) -> Self {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        // http(s) URLs always have path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(endpoint.segments());
        }

        let payload = if endpoint.method().has_body() {
            Some(payload.unwrap_or_default())
        } else {
            None
        };

        Self {
            endpoint,
            url,
            payload,
        }
    }

    /// The operation being called
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// HTTP method
    pub fn method(&self) -> Method {
        self.endpoint.method()
    }

    /// Absolute target URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// JSON body, for POST and PATCH
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.payload.as_ref()
    }
}

impl fmt::Display for ToolCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.url)?;
        if let Some(payload) = &self.payload {
            write!(f, " {}", Value::Object(payload.clone()))?;
        }
        Ok(())
    }
}
