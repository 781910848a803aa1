//! Run context — the mutable JSON object threaded through a pipeline.
//!
//! The context starts with the trigger input under `eventData` (and the
//! triggering record under `record` when there is one). After each
//! successful step the step's result is merged in under
//! `step_<actionId>_result`, so later steps and their conditions can see
//! earlier results.

use handlebars::Handlebars;
use serde_json::{Value, json};

use relay_domain::error::{ActionError, RelayError};
use relay_domain::id::ActionId;

/// The mutable context object for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    root: Value,
}

impl RunContext {
    /// Start a context carrying the trigger input.
    #[must_use]
    pub fn new(event_data: Value) -> Self {
        Self {
            root: json!({ "eventData": event_data }),
        }
    }

    /// Attach the triggering record, as exposed to predicates and templates.
    #[must_use]
    pub fn with_record(mut self, record: Value) -> Self {
        self.root["record"] = record;
        self
    }

    /// The context as a JSON object.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Consume the context, yielding the final snapshot.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.root
    }

    /// Merge a step result in under `step_<actionId>_result`.
    pub fn record_step_result(&mut self, action_id: ActionId, result: Value) {
        self.root[format!("step_{action_id}_result")] = result;
    }

    /// Render a `{{placeholder}}` template against this context.
    /// Unresolved placeholders render as the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Action`] when the template itself is
    /// malformed (unbalanced braces, bad helper syntax).
    pub fn render(&self, template: &str) -> Result<String, RelayError> {
        let registry = Handlebars::new();
        registry
            .render_template(template, &self.root)
            .map_err(|err| {
                ActionError::Template {
                    detail: err.to_string(),
                }
                .into()
            })
    }
}
