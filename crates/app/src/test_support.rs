//! In-memory port fakes shared by this crate's test modules.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use relay_domain::automation::Automation;
use relay_domain::error::{NotFoundError, RelayError};
use relay_domain::execution::{ExecutionLog, StepLog};
use relay_domain::id::{AutomationId, ExecutionId, RecordId};
use relay_domain::record::Record;

use crate::ports::{
    AutomationRepository, ExecutionLogStore, HttpClient, HttpResponse, Mailer, RecordStore,
};

#[derive(Clone, Default)]
pub struct FakeRecords {
    pub tables: Arc<Mutex<HashMap<String, Vec<Record>>>>,
}

impl FakeRecords {
    pub fn seed(&self, table: &str, fields: Value) -> RecordId {
        let record = Record::new(serde_json::from_value(fields).unwrap());
        let id = record.id;
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(record);
        id
    }
}

impl RecordStore for FakeRecords {
    fn list(&self, table: &str) -> impl Future<Output = Result<Vec<Record>, RelayError>> + Send {
        let result = self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default();
        async { Ok(result) }
    }

    fn get(
        &self,
        table: &str,
        id: RecordId,
    ) -> impl Future<Output = Result<Record, RelayError>> + Send {
        let result = self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .and_then(|records| records.iter().find(|r| r.id == id).cloned())
            .ok_or_else(|| NotFoundError::record(table, id).into());
        async { result }
    }

    fn create(
        &self,
        table: &str,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<Record, RelayError>> + Send {
        let record = Record::new(fields);
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        async { Ok(record) }
    }

    fn update(
        &self,
        table: &str,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<Record, RelayError>> + Send {
        let mut tables = self.tables.lock().unwrap();
        let result = tables
            .get_mut(table)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .map(|record| {
                record.merge_fields(fields);
                record.clone()
            })
            .ok_or_else(|| NotFoundError::record(table, id).into());
        async { result }
    }

    fn delete(
        &self,
        table: &str,
        id: RecordId,
    ) -> impl Future<Output = Result<(), RelayError>> + Send {
        let mut tables = self.tables.lock().unwrap();
        let result = match tables.get_mut(table) {
            Some(records) if records.iter().any(|r| r.id == id) => {
                records.retain(|r| r.id != id);
                Ok(())
            }
            _ => Err(NotFoundError::record(table, id).into()),
        };
        async { result }
    }
}

#[derive(Clone)]
pub struct FakeHttp {
    pub status: u16,
    pub requests: Arc<Mutex<Vec<(String, String, Option<Value>)>>>,
}

impl FakeHttp {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            requests: Arc::default(),
        }
    }
}

impl Default for FakeHttp {
    fn default() -> Self {
        Self::with_status(200)
    }
}

impl HttpClient for FakeHttp {
    fn request(
        &self,
        method: &str,
        url: &str,
        payload: Option<Value>,
    ) -> impl Future<Output = Result<HttpResponse, RelayError>> + Send {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), url.to_string(), payload));
        let status = self.status;
        async move {
            Ok(HttpResponse {
                status,
                body: serde_json::json!({"echo": true}),
            })
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeMailer {
    pub sent: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl Mailer for FakeMailer {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), RelayError>> + Send {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAutomationRepo {
    pub store: Arc<Mutex<HashMap<AutomationId, Automation>>>,
}

impl AutomationRepository for InMemoryAutomationRepo {
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, RelayError>> + Send {
        let mut store = self.store.lock().unwrap();
        store.insert(automation.id, automation.clone());
        async { Ok(automation) }
    }

    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, RelayError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store.get(&id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Automation>, RelayError>> + Send {
        let store = self.store.lock().unwrap();
        let result: Vec<Automation> = store.values().cloned().collect();
        async { Ok(result) }
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Automation>, RelayError>> + Send {
        let store = self.store.lock().unwrap();
        let result: Vec<Automation> = store.values().filter(|a| a.enabled).cloned().collect();
        async { Ok(result) }
    }

    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, RelayError>> + Send {
        let mut store = self.store.lock().unwrap();
        store.insert(automation.id, automation.clone());
        async { Ok(automation) }
    }

    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), RelayError>> + Send {
        let mut store = self.store.lock().unwrap();
        store.remove(&id);
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryLogStore {
    pub runs: Arc<Mutex<Vec<ExecutionLog>>>,
    pub steps: Arc<Mutex<Vec<StepLog>>>,
}

impl ExecutionLogStore for InMemoryLogStore {
    fn create_run(
        &self,
        log: ExecutionLog,
    ) -> impl Future<Output = Result<ExecutionLog, RelayError>> + Send {
        self.runs.lock().unwrap().push(log.clone());
        async { Ok(log) }
    }

    fn finalize_run(
        &self,
        log: ExecutionLog,
    ) -> impl Future<Output = Result<ExecutionLog, RelayError>> + Send {
        let mut runs = self.runs.lock().unwrap();
        if let Some(existing) = runs.iter_mut().find(|r| r.id == log.id) {
            *existing = log.clone();
        } else {
            runs.push(log.clone());
        }
        async { Ok(log) }
    }

    fn append_step(&self, step: StepLog) -> impl Future<Output = Result<(), RelayError>> + Send {
        self.steps.lock().unwrap().push(step);
        async { Ok(()) }
    }

    fn runs_for(
        &self,
        automation_id: AutomationId,
    ) -> impl Future<Output = Result<Vec<ExecutionLog>, RelayError>> + Send {
        let mut result: Vec<ExecutionLog> = self
            .runs
            .lock()
            .unwrap()
            .iter()
            .filter(|run| run.automation_id == automation_id)
            .cloned()
            .collect();
        result.reverse();
        async { Ok(result) }
    }

    fn steps_for(
        &self,
        execution_id: ExecutionId,
    ) -> impl Future<Output = Result<Vec<StepLog>, RelayError>> + Send {
        let result: Vec<StepLog> = self
            .steps
            .lock()
            .unwrap()
            .iter()
            .filter(|step| step.execution_id == execution_id)
            .cloned()
            .collect();
        async { Ok(result) }
    }
}
