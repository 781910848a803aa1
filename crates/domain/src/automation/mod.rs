//! Automation — trigger → condition → ordered action pipeline.
//!
//! Automations let the system react to record events, cron schedules, or
//! manual invocations without human intervention. Each automation has a
//! [`TriggerType`] that determines when it activates, an optional
//! [`Predicate`] that must hold, and an ordered list of [`Action`]s to
//! execute.

mod action;
mod predicate;
mod trigger;

pub use action::{
    Action, ActionKind, CallApiParams, CreateRecordParams, DeleteRecordParams, EmailParams,
    NotificationParams, ScriptParams, SlackParams, UpdateRecordParams,
};
pub use predicate::{Compare, GroupOperator, Predicate, passes};
pub use trigger::{DEFAULT_CRON, TriggerConfig, TriggerType};

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, ValidationError};
use crate::id::AutomationId;
use crate::time::Timestamp;

/// A rule binding a trigger to an ordered action pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automation {
    pub id: AutomationId,
    pub name: String,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_config: TriggerConfig,
    /// Table binding for record-event triggers; `None` matches any table.
    #[serde(default)]
    pub table: Option<String>,
    /// Automation-level gate evaluated once per run before any action.
    #[serde(default)]
    pub condition: Option<Predicate>,
    pub enabled: bool,
    pub actions: Vec<Action>,
    pub created_time: Timestamp,
    pub updated_time: Timestamp,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Automation {
    /// Create a builder for constructing an [`Automation`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] when `name` is empty
    /// ([`ValidationError::EmptyName`]).
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Whether this automation must own a live timer in the scheduler.
    #[must_use]
    pub fn wants_timer(&self) -> bool {
        self.trigger_type.is_scheduled() && self.enabled
    }

    /// Whether a record event on `table` with `trigger` should run this
    /// automation. An automation bound to no table matches any table.
    #[must_use]
    pub fn matches_record_event(&self, table: &str, trigger: TriggerType) -> bool {
        self.enabled
            && self.trigger_type == trigger
            && self.table.as_deref().is_none_or(|bound| bound == table)
    }

    /// Actions in execution order: ascending `order`, stable on ties so
    /// the persisted sequence breaks them.
    #[must_use]
    pub fn actions_in_order(&self) -> Vec<Action> {
        let mut actions = self.actions.clone();
        actions.sort_by_key(|action| action.order);
        actions
    }
}

/// Step-by-step builder for [`Automation`].
#[derive(Debug, Default)]
pub struct AutomationBuilder {
    id: Option<AutomationId>,
    name: Option<String>,
    trigger_type: Option<TriggerType>,
    trigger_config: TriggerConfig,
    table: Option<String>,
    condition: Option<Predicate>,
    enabled: Option<bool>,
    actions: Vec<Action>,
    created_by: Option<String>,
}

impl AutomationBuilder {
    #[must_use]
    pub fn id(mut self, id: AutomationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn trigger_type(mut self, trigger_type: TriggerType) -> Self {
        self.trigger_type = Some(trigger_type);
        self
    }

    #[must_use]
    pub fn cron(mut self, cron: impl Into<String>) -> Self {
        self.trigger_config.cron = Some(cron.into());
        self
    }

    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Predicate) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Consume the builder, validate, and return an [`Automation`].
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] if required fields are missing
    /// or empty.
    pub fn build(self) -> Result<Automation, RelayError> {
        let now = crate::time::now();
        let automation = Automation {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            trigger_type: self.trigger_type.unwrap_or(TriggerType::Manual),
            trigger_config: self.trigger_config,
            table: self.table,
            condition: self.condition,
            enabled: self.enabled.unwrap_or(true),
            actions: self.actions,
            created_time: now,
            updated_time: now,
            created_by: self.created_by,
        };
        automation.validate()?;
        Ok(automation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn script_action(order: i64) -> Action {
        Action::new(
            order,
            ActionKind::RunScript(ScriptParams {
                script: "return 1".to_string(),
            }),
        )
    }

    fn valid_automation() -> Automation {
        Automation::builder()
            .name("Notify on new task")
            .trigger_type(TriggerType::Create)
            .table("Tasks")
            .action(script_action(1))
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_valid_automation_when_required_fields_provided() {
        let auto = valid_automation();
        assert_eq!(auto.name, "Notify on new task");
        assert!(auto.enabled);
        assert!(auto.condition.is_none());
        assert_eq!(auto.actions.len(), 1);
    }

    #[test]
    fn should_default_to_manual_trigger_when_not_specified() {
        let auto = Automation::builder().name("Manual rule").build().unwrap();
        assert_eq!(auto.trigger_type, TriggerType::Manual);
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Automation::builder().build();
        assert!(matches!(
            result,
            Err(RelayError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_want_timer_only_when_scheduled_and_enabled() {
        let mut auto = Automation::builder()
            .name("Hourly digest")
            .trigger_type(TriggerType::Scheduled)
            .cron("0 * * * *")
            .build()
            .unwrap();
        assert!(auto.wants_timer());

        auto.enabled = false;
        assert!(!auto.wants_timer());

        auto.enabled = true;
        auto.trigger_type = TriggerType::Manual;
        assert!(!auto.wants_timer());
    }

    #[test]
    fn should_sort_actions_ascending_by_order() {
        let auto = Automation::builder()
            .name("Ordered")
            .action(script_action(2))
            .action(script_action(1))
            .action(script_action(3))
            .build()
            .unwrap();
        let orders: Vec<i64> = auto.actions_in_order().iter().map(|a| a.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn should_keep_persisted_sequence_on_order_ties() {
        let first = script_action(1);
        let second = script_action(1);
        let first_id = first.id;
        let second_id = second.id;
        let auto = Automation::builder()
            .name("Tied")
            .action(first)
            .action(second)
            .build()
            .unwrap();
        let ids: Vec<_> = auto.actions_in_order().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![first_id, second_id]);
    }

    #[test]
    fn should_match_record_event_for_bound_table() {
        let auto = valid_automation();
        assert!(auto.matches_record_event("Tasks", TriggerType::Create));
        assert!(!auto.matches_record_event("Other", TriggerType::Create));
        assert!(!auto.matches_record_event("Tasks", TriggerType::Update));
    }

    #[test]
    fn should_match_record_event_on_any_table_when_unbound() {
        let auto = Automation::builder()
            .name("Wildcard")
            .trigger_type(TriggerType::Update)
            .action(script_action(1))
            .build()
            .unwrap();
        assert!(auto.matches_record_event("Anything", TriggerType::Update));
    }

    #[test]
    fn should_not_match_record_event_when_disabled() {
        let mut auto = valid_automation();
        auto.enabled = false;
        assert!(!auto.matches_record_event("Tasks", TriggerType::Create));
    }

    #[test]
    fn should_roundtrip_automation_through_serde_json() {
        let auto = Automation::builder()
            .name("Roundtrip")
            .trigger_type(TriggerType::Scheduled)
            .cron("*/10 * * * *")
            .condition(Predicate::Leaf {
                field: "status".to_string(),
                compare: Compare::Equals,
                value: json!("active"),
            })
            .action(script_action(1))
            .build()
            .unwrap();

        let json = serde_json::to_string(&auto).unwrap();
        let parsed: Automation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, auto.id);
        assert_eq!(parsed.trigger_config, auto.trigger_config);
        assert_eq!(parsed.condition, auto.condition);
        assert_eq!(parsed.actions.len(), auto.actions.len());
    }
}
