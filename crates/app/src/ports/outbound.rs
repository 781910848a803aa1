//! Outbound transport ports — HTTP and email.

use std::future::Future;

use serde_json::Value;

use relay_domain::error::RelayError;

/// Response from one outbound HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// JSON body when the response parses as JSON, otherwise the raw
    /// text wrapped in a JSON string.
    pub body: Value,
}

impl HttpResponse {
    /// Whether the status code is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP used by callAPI, sendSlack and the script `fetch` binding.
///
/// Implementations must be cheaply cloneable (`Arc` inside) because the
/// script sandbox captures a clone per registered binding.
pub trait HttpClient: Clone + Send + Sync + 'static {
    /// Perform one request. `payload`, when present, is sent as a JSON body.
    ///
    /// Returns [`RelayError::Action`] on transport failure. Non-2xx
    /// responses are not errors; callers inspect [`HttpResponse::status`].
    fn request(
        &self,
        method: &str,
        url: &str,
        payload: Option<Value>,
    ) -> impl Future<Output = Result<HttpResponse, RelayError>> + Send;
}

/// Outbound email used by sendEmail.
pub trait Mailer {
    /// Send one message.
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), RelayError>> + Send;
}
