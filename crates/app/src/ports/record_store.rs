//! Record store port — table/record storage reached by actions and scripts.

use std::future::Future;

use serde_json::{Map, Value};

use relay_domain::error::RelayError;
use relay_domain::id::RecordId;
use relay_domain::record::Record;

/// Storage for named tables of records.
///
/// Implementations must be cheaply cloneable (`Arc` inside) because the
/// script sandbox captures a clone per registered binding.
pub trait RecordStore: Clone + Send + Sync + 'static {
    /// All records of one table.
    fn list(&self, table: &str) -> impl Future<Output = Result<Vec<Record>, RelayError>> + Send;

    /// One record by id.
    ///
    /// Returns [`RelayError::NotFound`] when the table or record is missing.
    fn get(
        &self,
        table: &str,
        id: RecordId,
    ) -> impl Future<Output = Result<Record, RelayError>> + Send;

    /// Create a record and return it with its assigned id.
    fn create(
        &self,
        table: &str,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<Record, RelayError>> + Send;

    /// Merge `fields` over an existing record and return the result.
    ///
    /// Returns [`RelayError::NotFound`] when the table or record is missing.
    fn update(
        &self,
        table: &str,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<Record, RelayError>> + Send;

    /// Delete a record.
    ///
    /// Returns [`RelayError::NotFound`] when the table or record is missing.
    fn delete(
        &self,
        table: &str,
        id: RecordId,
    ) -> impl Future<Output = Result<(), RelayError>> + Send;
}
