//! In-memory record tables.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};

use relay_app::ports::RecordStore;
use relay_domain::error::{NotFoundError, RelayError, StorageError};
use relay_domain::id::RecordId;
use relay_domain::record::Record;

type Tables = HashMap<String, Vec<Record>>;

/// Named record tables held in a shared in-process map. Tables are
/// created on first insert; reading an unknown table yields no records.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, bypassing the port. Intended for
    /// seeding demo or test data.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Storage`] when the store mutex is poisoned.
    pub fn seed(&self, table: &str, fields: Map<String, Value>) -> Result<RecordId, RelayError> {
        let record = Record::new(fields);
        let id = record.id;
        self.guard()?
            .entry(table.to_string())
            .or_default()
            .push(record);
        Ok(id)
    }

    fn guard(&self) -> Result<MutexGuard<'_, Tables>, RelayError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::new("record store mutex poisoned").into())
    }
}

impl RecordStore for MemoryRecordStore {
    fn list(&self, table: &str) -> impl Future<Output = Result<Vec<Record>, RelayError>> + Send {
        let result = self
            .guard()
            .map(|tables| tables.get(table).cloned().unwrap_or_default());
        async { result }
    }

    fn get(
        &self,
        table: &str,
        id: RecordId,
    ) -> impl Future<Output = Result<Record, RelayError>> + Send {
        let result = self.guard().and_then(|tables| {
            tables
                .get(table)
                .and_then(|records| records.iter().find(|record| record.id == id).cloned())
                .ok_or_else(|| NotFoundError::record(table, id).into())
        });
        async { result }
    }

    fn create(
        &self,
        table: &str,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<Record, RelayError>> + Send {
        let record = Record::new(fields);
        let result = self.guard().map(|mut tables| {
            tables
                .entry(table.to_string())
                .or_default()
                .push(record.clone());
            record
        });
        async { result }
    }

    fn update(
        &self,
        table: &str,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<Record, RelayError>> + Send {
        let result = self.guard().and_then(|mut tables| {
            tables
                .get_mut(table)
                .and_then(|records| records.iter_mut().find(|record| record.id == id))
                .map(|record| {
                    record.merge_fields(fields);
                    record.clone()
                })
                .ok_or_else(|| NotFoundError::record(table, id).into())
        });
        async { result }
    }

    fn delete(
        &self,
        table: &str,
        id: RecordId,
    ) -> impl Future<Output = Result<(), RelayError>> + Send {
        let result = self.guard().and_then(|mut tables| {
            let records = tables
                .get_mut(table)
                .filter(|records| records.iter().any(|record| record.id == id))
                .ok_or_else(|| RelayError::from(NotFoundError::record(table, id)))?;
            records.retain(|record| record.id != id);
            Ok(())
        });
        async { result }
    }
}
