//! Record — a row of named fields in a named table.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::RecordId;

/// A single row. Field names map to arbitrary JSON values; the engine
/// imposes no schema beyond the table name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record with a fresh id.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            id: RecordId::new(),
            fields,
        }
    }

    /// The value of one field, or JSON null when absent.
    #[must_use]
    pub fn cell_value(&self, field: &str) -> Value {
        self.fields.get(field).cloned().unwrap_or(Value::Null)
    }

    /// Merge `fields` over the existing field map, overwriting on key
    /// collision and leaving untouched keys as they were.
    pub fn merge_fields(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.fields.insert(key, value);
        }
    }

    /// The record as a plain JSON object, id included, as exposed to
    /// predicates and scripts.
    #[must_use]
    pub fn to_context_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("id".to_string(), Value::String(self.id.to_string()));
        Value::Object(object)
    }
}
