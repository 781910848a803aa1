//! Action — one typed step in an automation's pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::predicate::Predicate;
use crate::id::{ActionId, RecordId};

/// A step executed when its automation runs. Steps execute in ascending
/// `order`; ties keep their persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    /// Execution position within the pipeline; not required to be unique.
    pub order: i64,
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Optional step-level gate evaluated against the running context.
    #[serde(default)]
    pub condition: Option<Predicate>,
}

impl Action {
    /// Create an action at the given pipeline position.
    #[must_use]
    pub fn new(order: i64, kind: ActionKind) -> Self {
        Self {
            id: ActionId::new(),
            order,
            kind,
            condition: None,
        }
    }

    /// Attach a step-level condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Predicate) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// The typed behavior of an action, one variant per action type.
///
/// Parameters are validated once, when an action is decoded, rather than
/// read ad hoc out of opaque JSON during execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "camelCase")]
pub enum ActionKind {
    /// Run a user-supplied script in the sandbox.
    RunScript(ScriptParams),
    /// Issue one outbound HTTP request.
    #[serde(rename = "callAPI")]
    CallApi(CallApiParams),
    /// Emit a best-effort notification on the side channel.
    SendNotification(NotificationParams),
    /// Render and send one email.
    SendEmail(EmailParams),
    /// Render and post one message to a webhook.
    SendSlack(SlackParams),
    /// Merge fields into an existing record.
    UpdateRecord(UpdateRecordParams),
    /// Create a record in a named table.
    CreateRecord(CreateRecordParams),
    /// Delete a record from a named table.
    DeleteRecord(DeleteRecordParams),
}

impl ActionKind {
    /// The wire name of this action type, used in log messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunScript(_) => "runScript",
            Self::CallApi(_) => "callAPI",
            Self::SendNotification(_) => "sendNotification",
            Self::SendEmail(_) => "sendEmail",
            Self::SendSlack(_) => "sendSlack",
            Self::UpdateRecord(_) => "updateRecord",
            Self::CreateRecord(_) => "createRecord",
            Self::DeleteRecord(_) => "deleteRecord",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Parameters for [`ActionKind::RunScript`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptParams {
    /// Script source; an empty script fails at execution time.
    #[serde(default)]
    pub script: String,
}

/// Parameters for [`ActionKind::CallApi`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallApiParams {
    #[serde(default)]
    pub url: String,
    /// HTTP method; defaults to POST.
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub payload: Value,
}

fn default_method() -> String {
    "POST".to_string()
}

/// Parameters for [`ActionKind::SendNotification`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationParams {
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_message() -> String {
    "No message".to_string()
}

/// Parameters for [`ActionKind::SendEmail`]. Subject and body are
/// rendered as templates against the run context before sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailParams {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Parameters for [`ActionKind::SendSlack`]. The text is rendered as a
/// template against the run context before posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackParams {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub text: String,
}

/// Parameters for [`ActionKind::UpdateRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordParams {
    #[serde(default)]
    pub table_name: String,
    pub record_id: RecordId,
    /// Fields merged over the record's existing field map.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Parameters for [`ActionKind::CreateRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordParams {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Parameters for [`ActionKind::DeleteRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRecordParams {
    #[serde(default)]
    pub table_name: String,
    pub record_id: RecordId,
}
