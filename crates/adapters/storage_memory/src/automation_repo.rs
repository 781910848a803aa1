//! In-memory automation repository.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use relay_app::ports::AutomationRepository;
use relay_domain::automation::Automation;
use relay_domain::error::{RelayError, StorageError};
use relay_domain::id::AutomationId;

/// Automations held in a shared in-process map.
#[derive(Clone, Default)]
pub struct MemoryAutomationRepo {
    inner: Arc<Mutex<HashMap<AutomationId, Automation>>>,
}

impl MemoryAutomationRepo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<AutomationId, Automation>>, RelayError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::new("automation store mutex poisoned").into())
    }
}

impl AutomationRepository for MemoryAutomationRepo {
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, RelayError>> + Send {
        let result = self.guard().map(|mut store| {
            store.insert(automation.id, automation.clone());
            automation
        });
        async { result }
    }

    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, RelayError>> + Send {
        let result = self.guard().map(|store| store.get(&id).cloned());
        async { result }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Automation>, RelayError>> + Send {
        let result = self
            .guard()
            .map(|store| store.values().cloned().collect::<Vec<_>>());
        async { result }
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Automation>, RelayError>> + Send {
        let result = self.guard().map(|store| {
            store
                .values()
                .filter(|automation| automation.enabled)
                .cloned()
                .collect::<Vec<_>>()
        });
        async { result }
    }

    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, RelayError>> + Send {
        let result = self.guard().map(|mut store| {
            store.insert(automation.id, automation.clone());
            automation
        });
        async { result }
    }

    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), RelayError>> + Send {
        let result = self.guard().map(|mut store| {
            store.remove(&id);
        });
        async { result }
    }
}
