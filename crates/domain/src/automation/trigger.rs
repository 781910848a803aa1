//! Trigger — when an automation activates.

use serde::{Deserialize, Serialize};

/// What kind of event activates an automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerType {
    /// Fires when a record is created in the bound table.
    Create,
    /// Fires when a record is updated in the bound table.
    Update,
    /// Fires when a record is deleted from the bound table.
    Delete,
    /// Fires on a cron schedule from [`TriggerConfig::cron`].
    Scheduled,
    /// Fires only when invoked explicitly.
    Manual,
    /// Fires from a caller-defined external hook.
    Custom,
}

impl TriggerType {
    /// Whether this trigger type is driven by the cron scheduler.
    #[must_use]
    pub fn is_scheduled(self) -> bool {
        matches!(self, Self::Scheduled)
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Structured trigger configuration. Unknown keys are preserved-by-default
/// irrelevant here; only the cron expression matters to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Cron expression for scheduled triggers, 5-field crontab syntax.
    pub cron: Option<String>,
}

/// Fallback schedule when a scheduled automation has no cron configured.
pub const DEFAULT_CRON: &str = "0 * * * *";

impl TriggerConfig {
    /// The configured cron expression, or the hourly default.
    #[must_use]
    pub fn cron_or_default(&self) -> &str {
        self.cron.as_deref().unwrap_or(DEFAULT_CRON)
    }
}
