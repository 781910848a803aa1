//! Predicate — a boolean expression tree gating an automation or action.
//!
//! A predicate is either a group (`AND`/`OR` over child predicates) or a
//! leaf comparing one context field against a literal value. Evaluation is
//! a pure function of the predicate and the context object: leaves read
//! `context.record[field]`, falling back to `context.eventData[field]`
//! when no record is present.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConditionError;

/// A boolean expression tree evaluated against a run context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
    /// Logical combination of child predicates.
    Group {
        operator: GroupOperator,
        #[serde(rename = "conditions")]
        children: Vec<Predicate>,
    },
    /// A single field comparison.
    Leaf {
        field: String,
        compare: Compare,
        value: Value,
    },
}

/// Logical operator for a predicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    And,
    Or,
}

/// Comparison operator for a predicate leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Compare {
    /// Strict value equality.
    Equals,
    /// Strict value inequality.
    Not,
    /// True iff `value` is an array containing the field's value.
    In,
    /// Greater-than-or-equal under the value's native ordering.
    Gte,
    /// Less-than-or-equal under the value's native ordering.
    Lte,
}

impl Predicate {
    /// Decode a predicate from raw JSON, e.g. as persisted by storage.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError`] when the JSON does not describe a
    /// well-formed predicate (unknown operator, missing fields, …).
    pub fn from_value(value: &Value) -> Result<Self, ConditionError> {
        serde_json::from_value(value.clone()).map_err(|err| ConditionError {
            reason: err.to_string(),
        })
    }

    /// Evaluate this predicate against a context object.
    ///
    /// Never fails: a well-formed predicate always yields a boolean.
    /// Empty `AND` groups evaluate to `true`, empty `OR` groups to `false`.
    #[must_use]
    pub fn evaluate(&self, context: &Value) -> bool {
        match self {
            Self::Group { operator, children } => match operator {
                GroupOperator::And => children.iter().all(|child| child.evaluate(context)),
                GroupOperator::Or => children.iter().any(|child| child.evaluate(context)),
            },
            Self::Leaf {
                field,
                compare,
                value,
            } => compare.apply(&resolve_field(context, field), value),
        }
    }
}

/// Evaluate an optional predicate: absence always passes.
#[must_use]
pub fn passes(predicate: Option<&Predicate>, context: &Value) -> bool {
    predicate.is_none_or(|p| p.evaluate(context))
}

impl Compare {
    fn apply(self, field_value: &Value, expected: &Value) -> bool {
        match self {
            Self::Equals => field_value == expected,
            Self::Not => field_value != expected,
            Self::In => expected
                .as_array()
                .is_some_and(|items| items.contains(field_value)),
            Self::Gte => ordering(field_value, expected).is_some_and(std::cmp::Ordering::is_ge),
            Self::Lte => ordering(field_value, expected).is_some_and(std::cmp::Ordering::is_le),
        }
    }
}

/// Read `record[field]` when the context carries a record, otherwise
/// `eventData[field]`. Missing fields resolve to JSON null.
fn resolve_field(context: &Value, field: &str) -> Value {
    let source = match context.get("record") {
        Some(record) if !record.is_null() => record,
        _ => context.get("eventData").unwrap_or(&Value::Null),
    };
    source.get(field).cloned().unwrap_or(Value::Null)
}

/// Native ordering for JSON scalars: numbers by numeric value, strings
/// lexicographically, booleans false < true. Mixed types do not order.
fn ordering(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group { operator, children } => {
                let op = match operator {
                    GroupOperator::And => "AND",
                    GroupOperator::Or => "OR",
                };
                write!(f, "{op}[{}]", children.len())
            }
            Self::Leaf {
                field,
                compare,
                value,
            } => write!(f, "{field} {compare:?} {value}"),
        }
    }
}
