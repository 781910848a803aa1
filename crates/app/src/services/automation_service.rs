//! Automation service — CRUD use-cases plus timer reconciliation.
//!
//! Every mutation keeps the scheduler's timer registry consistent with
//! storage: creating or updating a scheduled automation (re)registers
//! its timer, disabling pauses it, deleting removes it before the row
//! disappears. CRUD changes are announced on the event bus, fire and
//! forget.

use std::sync::Arc;

use serde_json::{Value, json};

use relay_domain::automation::{Automation, TriggerType};
use relay_domain::error::{NotFoundError, RelayError};
use relay_domain::event::{Event, EventType};
use relay_domain::execution::ExecutionLog;
use relay_domain::id::AutomationId;

use crate::ports::{
    AutomationRepository, EventPublisher, ExecutionLogStore, HttpClient, Mailer, RecordStore,
};
use crate::runner::RunPipeline;
use crate::scheduler::TriggerScheduler;

/// Application service for managing and running automations.
pub struct AutomationService<R, L, S, H, M, P> {
    repo: R,
    pipeline: Arc<RunPipeline<R, L, S, H, M, P>>,
    scheduler: Arc<TriggerScheduler<R, L, S, H, M, P>>,
    events: P,
}

impl<R, L, S, H, M, P> AutomationService<R, L, S, H, M, P>
where
    R: AutomationRepository + Clone + Send + Sync + 'static,
    L: ExecutionLogStore + Send + Sync + 'static,
    S: RecordStore,
    H: HttpClient,
    M: Mailer + Send + Sync + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    pub fn new(
        repo: R,
        pipeline: Arc<RunPipeline<R, L, S, H, M, P>>,
        scheduler: Arc<TriggerScheduler<R, L, S, H, M, P>>,
        events: P,
    ) -> Self {
        Self {
            repo,
            pipeline,
            scheduler,
            events,
        }
    }

    /// Create a new automation and, when scheduled and enabled, register
    /// its timer.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] if invariants fail or the cron
    /// expression does not parse, or a storage error from the repository.
    #[tracing::instrument(skip(self, automation), fields(automation_name = %automation.name))]
    pub async fn create_automation(
        &self,
        automation: Automation,
    ) -> Result<Automation, RelayError> {
        automation.validate()?;
        let automation = self.repo.create(automation).await?;
        if automation.wants_timer() {
            self.scheduler.register_automation(&automation).await?;
        }
        self.announce(EventType::AutomationCreated, &automation).await;
        Ok(automation)
    }

    /// Look up an automation by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotFound`] when no automation with `id`
    /// exists, or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_automation(&self, id: AutomationId) -> Result<Automation, RelayError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Automation",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all automations.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_automations(&self) -> Result<Vec<Automation>, RelayError> {
        self.repo.get_all().await
    }

    /// Get all enabled automations.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_enabled(&self) -> Result<Vec<Automation>, RelayError> {
        self.repo.get_enabled().await
    }

    /// Update an existing automation and reconcile its timer: removed
    /// when no longer scheduled, paused when scheduled but disabled,
    /// (re)registered otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] if invariants fail, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, automation), fields(automation_id = %automation.id))]
    pub async fn update_automation(
        &self,
        automation: Automation,
    ) -> Result<Automation, RelayError> {
        automation.validate()?;
        let automation = self.repo.update(automation).await?;

        if !automation.trigger_type.is_scheduled() {
            self.scheduler.remove(automation.id).await;
        } else if automation.enabled {
            self.scheduler.register_automation(&automation).await?;
        } else {
            self.scheduler.stop(automation.id).await;
        }

        self.announce(EventType::AutomationUpdated, &automation).await;
        Ok(automation)
    }

    /// Flip the enabled flag. For scheduled automations this pauses or
    /// resumes the existing timer instead of re-registering it, so a
    /// true→false→true round trip never leaks a duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotFound`] for an unknown id, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn set_enabled(
        &self,
        id: AutomationId,
        enabled: bool,
    ) -> Result<Automation, RelayError> {
        let mut automation = self.get_automation(id).await?;
        automation.enabled = enabled;
        automation.updated_time = relay_domain::time::now();
        let automation = self.repo.update(automation).await?;

        if automation.trigger_type.is_scheduled() {
            if enabled {
                if !self.scheduler.start(id).await {
                    self.scheduler.register_automation(&automation).await?;
                }
            } else {
                self.scheduler.stop(id).await;
            }
        }

        self.announce(EventType::AutomationUpdated, &automation).await;
        Ok(automation)
    }

    /// Delete an automation. The timer goes first, so a tick can never
    /// race the row's disappearance.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_automation(&self, id: AutomationId) -> Result<(), RelayError> {
        self.scheduler.remove(id).await;
        self.repo.delete(id).await?;
        let event = Event::new(EventType::AutomationRemoved, Some(id), json!({}));
        if let Err(err) = self.events.publish(event).await {
            tracing::warn!(error = %err, "automation event publish failed");
        }
        Ok(())
    }

    /// Run an automation now, as a normal (non-test) run.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotFound`] for an unknown id, or a storage
    /// error; action failures are captured into the returned log instead.
    pub async fn run_automation(
        &self,
        id: AutomationId,
        event_data: Value,
    ) -> Result<Option<ExecutionLog>, RelayError> {
        self.pipeline.run(id, event_data, false).await
    }

    /// Run an automation in test mode: the enabled flag and all
    /// condition gates are bypassed.
    ///
    /// # Errors
    ///
    /// Same as [`AutomationService::run_automation`].
    pub async fn test_automation(
        &self,
        id: AutomationId,
        event_data: Value,
    ) -> Result<ExecutionLog, RelayError> {
        let log = self.pipeline.run(id, event_data, true).await?;
        // Test runs bypass the enabled gate, so the pipeline always
        // produces a log here.
        log.ok_or_else(|| {
            NotFoundError {
                entity: "ExecutionLog",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Fan a record event out to every matching enabled automation.
    /// Failures are isolated per automation; one broken rule never
    /// blocks the rest. Returns the number of automations run.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the automation list cannot be read.
    #[tracing::instrument(skip(self, record))]
    pub async fn handle_record_event(
        &self,
        table: &str,
        trigger: TriggerType,
        record: Value,
    ) -> Result<usize, RelayError> {
        let mut matched = 0;
        for automation in self.repo.get_enabled().await? {
            if !automation.matches_record_event(table, trigger) {
                continue;
            }
            matched += 1;
            let event_data = json!({ "record": record.clone() });
            if let Err(err) = self.pipeline.run(automation.id, event_data, false).await {
                tracing::warn!(
                    automation_id = %automation.id,
                    error = %err,
                    "record-triggered run failed"
                );
            }
        }
        Ok(matched)
    }

    async fn announce(&self, event_type: EventType, automation: &Automation) {
        let event = Event::new(
            event_type,
            Some(automation.id),
            json!({ "name": automation.name }),
        );
        if let Err(err) = self.events.publish(event).await {
            tracing::warn!(error = %err, "automation event publish failed");
        }
    }
}
