//! Execution logs — the audit trail of automation runs.
//!
//! Every run produces one [`ExecutionLog`], created when the run starts
//! and finalized exactly once at completion. Every action attempted or
//! explicitly skipped produces one [`StepLog`]; actions never reached
//! because an earlier step failed produce nothing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{ActionId, AutomationId, ExecutionId};
use crate::time::Timestamp;

/// Outcome of a run or a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// The per-run audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: ExecutionId,
    pub automation_id: AutomationId,
    /// Snapshot of the input that triggered the run.
    pub event_data: Value,
    pub status: RunStatus,
    /// Final context snapshot on success; omitted on failure.
    pub result: Option<Value>,
    /// The failing step's message on failure.
    pub error: Option<String>,
    pub executed_at: Timestamp,
    /// Test runs bypass the enabled gate and condition gates.
    pub is_test: bool,
}

impl ExecutionLog {
    /// Start a new log with a provisional success status.
    #[must_use]
    pub fn started(automation_id: AutomationId, event_data: Value, is_test: bool) -> Self {
        Self {
            id: ExecutionId::new(),
            automation_id,
            event_data,
            status: RunStatus::Success,
            result: None,
            error: None,
            executed_at: crate::time::now(),
            is_test,
        }
    }

    /// Finalize as successful with a result payload.
    #[must_use]
    pub fn succeeded(mut self, result: Value) -> Self {
        self.status = RunStatus::Success;
        self.result = Some(result);
        self.error = None;
        self
    }

    /// Finalize as failed with a human-readable message.
    #[must_use]
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = RunStatus::Error;
        self.result = None;
        self.error = Some(error.into());
        self
    }
}

/// The per-step audit record within one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepLog {
    pub execution_id: ExecutionId,
    pub action_id: ActionId,
    pub status: RunStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    /// Console lines captured from the step's script, in arrival order.
    #[serde(default)]
    pub console_output: Vec<String>,
}

impl StepLog {
    /// Record a successful step.
    #[must_use]
    pub fn success(
        execution_id: ExecutionId,
        action_id: ActionId,
        result: Value,
        console_output: Vec<String>,
    ) -> Self {
        Self {
            execution_id,
            action_id,
            status: RunStatus::Success,
            result: Some(result),
            error: None,
            console_output,
        }
    }

    /// Record a failed step.
    #[must_use]
    pub fn error(
        execution_id: ExecutionId,
        action_id: ActionId,
        error: impl Into<String>,
        console_output: Vec<String>,
    ) -> Self {
        Self {
            execution_id,
            action_id,
            status: RunStatus::Error,
            result: None,
            error: Some(error.into()),
            console_output,
        }
    }
}
