//! Execution log store port — the run audit trail.

use std::future::Future;

use relay_domain::error::RelayError;
use relay_domain::execution::{ExecutionLog, StepLog};
use relay_domain::id::{AutomationId, ExecutionId};

/// Append-oriented store for run and step logs.
pub trait ExecutionLogStore {
    /// Persist a freshly started run log.
    fn create_run(
        &self,
        log: ExecutionLog,
    ) -> impl Future<Output = Result<ExecutionLog, RelayError>> + Send;

    /// Overwrite a run log with its finalized state.
    fn finalize_run(
        &self,
        log: ExecutionLog,
    ) -> impl Future<Output = Result<ExecutionLog, RelayError>> + Send;

    /// Append one step log to a run.
    fn append_step(&self, step: StepLog) -> impl Future<Output = Result<(), RelayError>> + Send;

    /// All run logs for one automation, most recent first.
    fn runs_for(
        &self,
        automation_id: AutomationId,
    ) -> impl Future<Output = Result<Vec<ExecutionLog>, RelayError>> + Send;

    /// All step logs for one run, in append order.
    fn steps_for(
        &self,
        execution_id: ExecutionId,
    ) -> impl Future<Output = Result<Vec<StepLog>, RelayError>> + Send;
}
