//! Engine events published on the in-process bus.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{AutomationId, EventId};
use crate::time::Timestamp;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AutomationCreated,
    AutomationUpdated,
    AutomationRemoved,
    /// A run finished, successfully or not; the payload carries the
    /// final status and error message if any.
    RunCompleted,
    /// Best-effort side-channel message from a sendNotification step.
    Notification,
}

/// An event as carried on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    /// The automation this event concerns, when there is one.
    pub automation_id: Option<AutomationId>,
    pub payload: Value,
    pub timestamp: Timestamp,
}

impl Event {
    #[must_use]
    pub fn new(event_type: EventType, automation_id: Option<AutomationId>, payload: Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            automation_id,
            payload,
            timestamp: crate::time::now(),
        }
    }
}
