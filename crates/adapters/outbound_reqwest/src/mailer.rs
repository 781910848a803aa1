//! Mail transport that logs instead of sending.

use std::future::Future;

use relay_app::ports::Mailer;
use relay_domain::error::RelayError;

/// Writes outgoing mail to the log. Deployments with a real mail relay
/// replace this with an SMTP-backed `Mailer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMailer;

impl TracingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Mailer for TracingMailer {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), RelayError>> + Send {
        tracing::info!(to, subject, body_len = body.len(), "email sent");
        tracing::debug!(body, "email body");
        async { Ok(()) }
    }
}
