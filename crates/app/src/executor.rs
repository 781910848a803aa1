//! Action executor — one exhaustive dispatch per action type.
//!
//! Each arm resolves its typed params against the run context, invokes
//! the relevant port, and yields a JSON result payload that the pipeline
//! merges back into the context. Required-but-empty params fail with
//! [`ValidationError::MissingParam`] before any side effect happens.

use serde_json::{Value, json};

use relay_domain::automation::ActionKind;
use relay_domain::error::{ActionError, RelayError, ValidationError};
use relay_domain::event::{Event, EventType};

use crate::context::RunContext;
use crate::ports::{EventPublisher, HttpClient, Mailer, RecordStore};
use crate::sandbox::{ScriptFailure, ScriptRuntime};

/// Result of one executed action.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Payload merged into the context under `step_<actionId>_result`.
    pub result: Value,
    /// Console lines for script steps; empty for all other types.
    pub console: Vec<String>,
}

/// A failed action, with whatever console output it produced first.
#[derive(Debug)]
pub struct StepFailure {
    pub error: RelayError,
    pub console: Vec<String>,
}

impl StepFailure {
    fn new(error: impl Into<RelayError>) -> Self {
        Self {
            error: error.into(),
            console: Vec::new(),
        }
    }
}

impl From<ScriptFailure> for StepFailure {
    fn from(failure: ScriptFailure) -> Self {
        Self {
            error: failure.error.into(),
            console: failure.console,
        }
    }
}

/// Executes typed actions against the engine's outbound ports.
pub struct ActionExecutor<S, H, M, P> {
    records: S,
    http: H,
    mailer: M,
    events: P,
    scripts: ScriptRuntime<S, H>,
}

impl<S, H, M, P> ActionExecutor<S, H, M, P>
where
    S: RecordStore,
    H: HttpClient,
    M: Mailer,
    P: EventPublisher,
{
    pub fn new(records: S, http: H, mailer: M, events: P) -> Self {
        let scripts = ScriptRuntime::new(records.clone(), http.clone());
        Self {
            records,
            http,
            mailer,
            events,
            scripts,
        }
    }

    /// Override the script sandbox deadline.
    #[must_use]
    pub fn with_script_timeout(mut self, timeout_secs: u64) -> Self {
        self.scripts = self.scripts.with_timeout(timeout_secs);
        self
    }

    /// Execute one action against the running context.
    ///
    /// # Errors
    ///
    /// Returns a [`StepFailure`] wrapping the underlying validation,
    /// script, transport, or storage error.
    #[tracing::instrument(skip(self, kind, context), fields(action = %kind))]
    pub async fn execute(
        &self,
        kind: &ActionKind,
        context: &RunContext,
    ) -> Result<StepOutput, StepFailure> {
        match kind {
            ActionKind::RunScript(params) => {
                let outcome = self.scripts.run(&params.script, context.as_value()).await?;
                Ok(StepOutput {
                    result: outcome.result,
                    console: outcome.console,
                })
            }

            ActionKind::CallApi(params) => {
                require(!params.url.is_empty(), "callAPI", "url")?;
                let payload = match &params.payload {
                    Value::Null => None,
                    other => Some(other.clone()),
                };
                let response = self
                    .http
                    .request(&params.method, &params.url, payload)
                    .await
                    .map_err(StepFailure::new)?;
                if !response.is_success() {
                    return Err(StepFailure::new(ActionError::Transport {
                        transport: "http",
                        detail: format!("{} returned status {}", params.url, response.status),
                    }));
                }
                Ok(StepOutput {
                    result: response.body,
                    console: Vec::new(),
                })
            }

            ActionKind::SendNotification(params) => {
                // Best-effort by design: a notification step never fails
                // the pipeline, even when nobody is listening.
                let message = context
                    .render(&params.message)
                    .unwrap_or_else(|_| params.message.clone());
                let event = Event::new(
                    EventType::Notification,
                    None,
                    json!({ "message": message }),
                );
                if let Err(err) = self.events.publish(event).await {
                    tracing::warn!(error = %err, "notification publish failed");
                }
                Ok(StepOutput {
                    result: json!({ "notificationSent": true, "message": message }),
                    console: Vec::new(),
                })
            }

            ActionKind::SendEmail(params) => {
                require(!params.to.is_empty(), "sendEmail", "to")?;
                let subject = context.render(&params.subject).map_err(StepFailure::new)?;
                let body = context.render(&params.body).map_err(StepFailure::new)?;
                self.mailer
                    .send(&params.to, &subject, &body)
                    .await
                    .map_err(StepFailure::new)?;
                Ok(StepOutput {
                    result: json!({ "emailSent": true, "to": params.to }),
                    console: Vec::new(),
                })
            }

            ActionKind::SendSlack(params) => {
                require(!params.webhook_url.is_empty(), "sendSlack", "webhookUrl")?;
                let text = context.render(&params.text).map_err(StepFailure::new)?;
                let response = self
                    .http
                    .request("POST", &params.webhook_url, Some(json!({ "text": text })))
                    .await
                    .map_err(StepFailure::new)?;
                if !response.is_success() {
                    return Err(StepFailure::new(ActionError::Transport {
                        transport: "slack",
                        detail: format!("webhook returned status {}", response.status),
                    }));
                }
                Ok(StepOutput {
                    result: json!({ "ok": true, "resp": response.body }),
                    console: Vec::new(),
                })
            }

            ActionKind::UpdateRecord(params) => {
                require(!params.table_name.is_empty(), "updateRecord", "tableName")?;
                let record = self
                    .records
                    .update(&params.table_name, params.record_id, params.fields.clone())
                    .await
                    .map_err(StepFailure::new)?;
                Ok(StepOutput {
                    result: record.to_context_value(),
                    console: Vec::new(),
                })
            }

            ActionKind::CreateRecord(params) => {
                require(!params.table_name.is_empty(), "createRecord", "tableName")?;
                let record = self
                    .records
                    .create(&params.table_name, params.fields.clone())
                    .await
                    .map_err(StepFailure::new)?;
                Ok(StepOutput {
                    result: json!({ "id": record.id.to_string() }),
                    console: Vec::new(),
                })
            }

            ActionKind::DeleteRecord(params) => {
                require(!params.table_name.is_empty(), "deleteRecord", "tableName")?;
                self.records
                    .delete(&params.table_name, params.record_id)
                    .await
                    .map_err(StepFailure::new)?;
                Ok(StepOutput {
                    result: json!({ "deleted": true }),
                    console: Vec::new(),
                })
            }
        }
    }
}

fn require(present: bool, action: &'static str, param: &'static str) -> Result<(), StepFailure> {
    if present {
        Ok(())
    } else {
        Err(StepFailure::new(ValidationError::MissingParam {
            action,
            param,
        }))
    }
}
