//! Automation repository port — persistence for automations.

use std::future::Future;

use relay_domain::automation::Automation;
use relay_domain::error::RelayError;
use relay_domain::id::AutomationId;

/// Repository for persisting and querying [`Automation`]s.
pub trait AutomationRepository {
    /// Create a new automation in storage.
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, RelayError>> + Send;

    /// Get an automation by its unique identifier.
    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, RelayError>> + Send;

    /// Get all automations.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Automation>, RelayError>> + Send;

    /// Get all enabled automations.
    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Automation>, RelayError>> + Send;

    /// Update an existing automation, replacing its action list atomically.
    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, RelayError>> + Send;

    /// Delete an automation by its unique identifier.
    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), RelayError>> + Send;
}
