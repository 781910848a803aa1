//! Common error types used across the workspace.
//!
//! One top-level [`RelayError`] enum with typed source errors and `#[from]`
//! conversion. Each failure class keeps its own type so callers can match
//! on the class without parsing message strings, while every error still
//! renders a human-readable message for execution logs.

use crate::id::RecordId;

/// Top-level error for the relay engine.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A domain invariant or action parameter check failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced automation, table, or record does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A persisted predicate could not be evaluated.
    #[error(transparent)]
    Condition(#[from] ConditionError),

    /// An action failed while executing.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// The storage collaborator failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ScriptError> for RelayError {
    fn from(err: ScriptError) -> Self {
        Self::Action(ActionError::Script(err))
    }
}

/// Domain invariant or parameter validation failure. Surfaced to the
/// caller, never retried.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An automation must have a non-empty name.
    #[error("automation name must not be empty")]
    EmptyName,

    /// A cron expression could not be parsed.
    #[error("invalid cron expression {expr:?}: {reason}")]
    InvalidCron { expr: String, reason: String },

    /// A required action parameter is missing or empty.
    #[error("{action} requires {param}")]
    MissingParam {
        action: &'static str,
        param: &'static str,
    },
}

/// A lookup by identifier found nothing.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    /// Entity kind, e.g. `"Automation"`, `"Table"`, `"Record"`.
    pub entity: &'static str,
    /// The identifier that failed to resolve.
    pub id: String,
}

impl NotFoundError {
    /// Not-found error for a record within a named table.
    #[must_use]
    pub fn record(table: &str, id: RecordId) -> Self {
        Self {
            entity: "Record",
            id: format!("{id} in table {table:?}"),
        }
    }
}

/// A persisted predicate was structurally malformed. Aborts the run and
/// is recorded as the run-level error.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("condition could not be evaluated: {reason}")]
pub struct ConditionError {
    pub reason: String,
}

/// An action-type-specific execution failure. Aborts the remaining
/// pipeline; recorded at both step and run level.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The sandboxed script failed or timed out.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// An outbound HTTP, email, or chat transport failed.
    #[error("{transport} transport failed: {detail}")]
    Transport {
        transport: &'static str,
        detail: String,
    },

    /// A message template could not be rendered.
    #[error("template render failed: {detail}")]
    Template { detail: String },
}

/// Failure inside the sandboxed script runtime.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The action carried no script source.
    #[error("no script content")]
    EmptySource,

    /// The script threw a runtime error.
    #[error("script failed: {0}")]
    Runtime(String),

    /// The script exceeded its wall-clock deadline.
    #[error("script exceeded the {0}s execution deadline")]
    Timeout(u64),
}

/// Failure reported by a storage collaborator.
#[derive(Debug, thiserror::Error)]
#[error("storage failure: {detail}")]
pub struct StorageError {
    pub detail: String,
}

impl StorageError {
    /// Build a storage error from any displayable cause.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
