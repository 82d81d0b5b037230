// ── Data provider ──
//
// The single entry point. Bulk update/delete fan out into one request per
// id and are joined positionally; every other action is one request built
// by `request`, sent through the `HttpClient`, and shaped by `response`.

use std::fmt;
use std::sync::Arc;

use crudbridge_api::{FetchClient, HttpClient, HttpMethod, HttpRequest, TransportConfig};
use futures_util::future::try_join_all;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::action::{Action, ActionKind, Identifier};
use crate::error::CoreError;
use crate::request::{build_request, record_url};
use crate::response::{ProviderResult, normalize_response};

/// Translates CRUD actions into backend HTTP calls.
///
/// Stateless apart from the base URL and a shared `HttpClient`; cheap to
/// clone and safe to share across tasks.
#[derive(Clone)]
pub struct DataProvider {
    api_url: String,
    http: Arc<dyn HttpClient>,
}

impl fmt::Debug for DataProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataProvider")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl DataProvider {
    // ── Constructors ─────────────────────────────────────────────────

    /// Provider backed by a default `FetchClient`.
    pub fn new(api_url: &str) -> Result<Self, CoreError> {
        let client = FetchClient::new(&TransportConfig::default())?;
        Self::with_client(api_url, Arc::new(client))
    }

    /// Provider using a caller-supplied HTTP client (custom headers, auth,
    /// test doubles).
    pub fn with_client(api_url: &str, http: Arc<dyn HttpClient>) -> Result<Self, CoreError> {
        Url::parse(api_url)?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_owned(),
            http,
        })
    }

    /// Base URL with any trailing `/` removed.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ── Entry points ─────────────────────────────────────────────────

    /// Untyped entry point: `kind` is an action name such as `"GET_LIST"`,
    /// `params` the JSON params for that kind.
    ///
    /// Unknown kinds and malformed params fail before any HTTP call.
    pub async fn call(
        &self,
        kind: &str,
        resource: &str,
        params: Value,
    ) -> Result<ProviderResult, CoreError> {
        let kind = ActionKind::parse(kind)?;
        let action = Action::from_params(kind, params)?;
        self.dispatch(resource, action).await
    }

    /// Typed entry point.
    #[instrument(skip(self, action), fields(action = %action.kind()))]
    pub async fn dispatch(
        &self,
        resource: &str,
        action: Action,
    ) -> Result<ProviderResult, CoreError> {
        action.validate()?;
        debug!("dispatching");

        match action {
            Action::UpdateMany(params) => {
                let body = params.data.to_string();
                self.fan_out(resource, &params.ids, |url| {
                    HttpRequest::with_body(HttpMethod::Put, url, body.clone())
                })
                .await
            }
            Action::DeleteMany(params) => {
                self.fan_out(resource, &params.ids, HttpRequest::delete)
                    .await
            }
            action => {
                let request = build_request(&self.api_url, resource, &action)?;
                let response = self.http.fetch_json(request).await?;
                Ok(normalize_response(response, &action))
            }
        }
    }

    // ── Bulk fan-out ─────────────────────────────────────────────────

    /// One request per id, all in flight at once, results in id order.
    ///
    /// The first failure fails the whole call and drops the requests still
    /// in flight. There is no concurrency cap.
    async fn fan_out<F>(
        &self,
        resource: &str,
        ids: &[Identifier],
        make_request: F,
    ) -> Result<ProviderResult, CoreError>
    where
        F: Fn(String) -> HttpRequest + Send,
    {
        debug!(count = ids.len(), "fanning out bulk request");

        let requests = ids
            .iter()
            .map(|id| make_request(record_url(&self.api_url, resource, id)))
            .map(|request| self.http.fetch_json(request));

        let responses = try_join_all(requests).await?;
        let data = responses.into_iter().map(|r| r.json).collect();
        Ok(ProviderResult::data(Value::Array(data)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let provider = DataProvider::new("http://api/v1/").unwrap();
        assert_eq!(provider.api_url(), "http://api/v1");
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        let err = DataProvider::new("not a url").unwrap_err();
        assert!(matches!(err, CoreError::InvalidApiUrl(_)));
    }

    #[test]
    fn unknown_kind_fails_before_network() {
        // nothing listens on this port; an HTTP attempt would surface as Http(_)
        let provider = DataProvider::new("http://127.0.0.1:9").unwrap();
        let err = tokio_test::block_on(provider.call("GET_EVERYTHING", "posts", Value::Null))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedAction { .. }));
    }

    #[test]
    fn malformed_params_fail_before_network() {
        let provider = DataProvider::new("http://127.0.0.1:9").unwrap();
        let err = tokio_test::block_on(provider.call(
            "GET_ONE",
            "posts",
            serde_json::json!({"identifier": 1}),
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidParams {
                action: ActionKind::GetOne,
                ..
            }
        ));
    }
}
