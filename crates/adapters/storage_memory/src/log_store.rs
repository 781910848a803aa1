//! In-memory execution log store.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use relay_app::ports::ExecutionLogStore;
use relay_domain::error::{RelayError, StorageError};
use relay_domain::execution::{ExecutionLog, StepLog};
use relay_domain::id::{AutomationId, ExecutionId};

#[derive(Default)]
struct Inner {
    runs: Vec<ExecutionLog>,
    steps: Vec<StepLog>,
}

/// Run and step logs held in process memory, in append order.
#[derive(Clone, Default)]
pub struct MemoryLogStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryLogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, Inner>, RelayError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::new("log store mutex poisoned").into())
    }
}

impl ExecutionLogStore for MemoryLogStore {
    fn create_run(
        &self,
        log: ExecutionLog,
    ) -> impl Future<Output = Result<ExecutionLog, RelayError>> + Send {
        let result = self.guard().map(|mut inner| {
            inner.runs.push(log.clone());
            log
        });
        async { result }
    }

    fn finalize_run(
        &self,
        log: ExecutionLog,
    ) -> impl Future<Output = Result<ExecutionLog, RelayError>> + Send {
        let result = self.guard().map(|mut inner| {
            match inner.runs.iter_mut().find(|run| run.id == log.id) {
                Some(existing) => *existing = log.clone(),
                None => inner.runs.push(log.clone()),
            }
            log
        });
        async { result }
    }

    fn append_step(&self, step: StepLog) -> impl Future<Output = Result<(), RelayError>> + Send {
        let result = self.guard().map(|mut inner| {
            inner.steps.push(step);
        });
        async { result }
    }

    fn runs_for(
        &self,
        automation_id: AutomationId,
    ) -> impl Future<Output = Result<Vec<ExecutionLog>, RelayError>> + Send {
        let result = self.guard().map(|inner| {
            inner
                .runs
                .iter()
                .rev()
                .filter(|run| run.automation_id == automation_id)
                .cloned()
                .collect::<Vec<_>>()
        });
        async { result }
    }

    fn steps_for(
        &self,
        execution_id: ExecutionId,
    ) -> impl Future<Output = Result<Vec<StepLog>, RelayError>> + Send {
        let result = self.guard().map(|inner| {
            inner
                .steps
                .iter()
                .filter(|step| step.execution_id == execution_id)
                .cloned()
                .collect::<Vec<_>>()
        });
        async { result }
    }
}
