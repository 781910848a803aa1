//! HTTP client adapter backed by reqwest.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use relay_app::ports::{HttpClient, HttpResponse};
use relay_domain::error::{ActionError, RelayError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound HTTP through a shared reqwest client.
///
/// Non-2xx responses are returned as data, not errors; only transport
/// failures (DNS, connect, request timeout) become [`ActionError`]s.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn request(
        &self,
        method: &str,
        url: &str,
        payload: Option<Value>,
    ) -> impl Future<Output = Result<HttpResponse, RelayError>> + Send {
        let client = self.client.clone();
        let method = method.to_string();
        let url = url.to_string();

        async move {
            let method =
                reqwest::Method::from_bytes(method.as_bytes()).map_err(|_| transport_err(
                    format!("unsupported HTTP method {method:?}"),
                ))?;

            let mut request = client.request(method, &url);
            if let Some(payload) = payload {
                request = request.json(&payload);
            }

            let response = request
                .send()
                .await
                .map_err(|err| transport_err(err.to_string()))?;
            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .map_err(|err| transport_err(err.to_string()))?;

            Ok(HttpResponse {
                status,
                body: parse_body(&text),
            })
        }
    }
}

fn transport_err(detail: String) -> RelayError {
    ActionError::Transport {
        transport: "http",
        detail,
    }
    .into()
}

/// JSON bodies come back structured; anything else as a JSON string.
fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
