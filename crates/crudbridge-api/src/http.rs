// Plain-data HTTP types shared by the provider and its transport.
//
// The provider builds `HttpRequest` values without touching the network
// and reads `HttpResponse` values after the round-trip. Keeping both as
// plain data lets the request builder and response normalizer be tested
// without a server.

use serde_json::Value;
use strum::{AsRefStr, Display};

pub use reqwest::header::HeaderMap;

/// HTTP method for a request. Absent means GET.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// An HTTP request described as plain data.
///
/// `body`, when present, is an already-serialized JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Delete,
            url: url.into(),
            body: None,
        }
    }

    /// Request with a JSON body. `body` must already be serialized.
    pub fn with_body(method: HttpMethod, url: impl Into<String>, body: String) -> Self {
        Self {
            method,
            url: url.into(),
            body: Some(body),
        }
    }

    /// Parse the body back into JSON. `None` when there is no body or it
    /// is not valid JSON.
    pub fn json_body(&self) -> Option<Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
    }
}

/// An HTTP response described as plain data.
///
/// `json` is the parsed `body`, or `Value::Null` when the body is empty
/// or not JSON (DELETE endpoints commonly answer with nothing).
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
    pub json: Value,
}

impl HttpResponse {
    /// Build a 200 response around a JSON value. Handy for custom clients
    /// and tests.
    pub fn from_json(json: Value) -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body: json.to_string(),
            json,
        }
    }
}
