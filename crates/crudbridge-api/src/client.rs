// Fetch-json HTTP client
//
// `HttpClient` is the seam the data provider calls through. `FetchClient`
// is the default implementation on top of `reqwest::Client`: it sends JSON,
// reads the whole body, parses it leniently, and turns any non-2xx status
// into `Error::Http`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::TransportConfig;

/// Error body shape most REST backends answer with on failure.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<Value>,
}

/// Executes one HTTP round-trip and hands back the parsed response.
///
/// Implementations must resolve with the parsed JSON body on a 2xx status
/// and fail otherwise. The provider never retries or wraps these errors.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn fetch_json(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

// ── Client ───────────────────────────────────────────────────────────

/// Default `HttpClient` backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
}

impl FetchClient {
    /// Build from a transport config.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages headers, TLS, auth).
    pub fn from_reqwest(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Response handling ────────────────────────────────────────────

    async fn read_response(resp: reqwest::Response) -> Result<HttpResponse, Error> {
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await?;
        trace!(status = status.as_u16(), body = %body, "response body");

        let json = parse_lenient(&body);

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                message: error_message(status, &body),
                body,
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
            json,
        })
    }
}

#[async_trait]
impl HttpClient for FetchClient {
    async fn fetch_json(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self
            .http
            .request(request.method.into(), request.url.as_str())
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        let resp = builder.send().await?;
        Self::read_response(resp).await
    }
}

/// Parse a body as JSON; empty or malformed bodies become `null`.
fn parse_lenient(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|e| {
        debug!(error = %e, "response body is not JSON");
        Value::Null
    })
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .and_then(|m| match m {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|i| i.as_str().map_or_else(|| i.to_string(), str::to_owned))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        });

    from_body.unwrap_or_else(|| {
        status
            .canonical_reason()
            .map_or_else(|| status.as_u16().to_string(), str::to_owned)
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;

    #[test]
    fn lenient_parse_handles_empty_and_garbage() {
        assert_eq!(parse_lenient(""), Value::Null);
        assert_eq!(parse_lenient("  \n"), Value::Null);
        assert_eq!(parse_lenient("<html>"), Value::Null);
        assert_eq!(parse_lenient(r#"{"a":1}"#), json!({"a": 1}));
    }

    #[test]
    fn error_message_prefers_body_message() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"message":"title required"}"#);
        assert_eq!(msg, "title required");
    }

    #[test]
    fn error_message_joins_validation_lists() {
        let body = r#"{"statusCode":400,"message":["title should not be empty","age must be a number"]}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "title should not be empty, age must be a number"
        );
    }

    #[test]
    fn error_message_falls_back_to_reason() {
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"x"}"#),
            "Internal Server Error"
        );
    }
}
