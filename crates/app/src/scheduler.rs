//! Trigger scheduler — one live timer per scheduled, enabled automation.
//!
//! The timer registry is the only process-wide mutable shared state in
//! the engine core; all mutations go through one async mutex so that
//! concurrent automation updates cannot leak duplicate timers.
//! Registering an id that already has a timer silently replaces it.
//! Stopping pauses the timer without dropping it; starting resumes it.
//! Each fire spawns a pipeline run without awaiting it, so a slow run
//! never delays the next tick.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use relay_domain::automation::Automation;
use relay_domain::error::{RelayError, ValidationError};
use relay_domain::id::AutomationId;

use crate::ports::{
    AutomationRepository, EventPublisher, ExecutionLogStore, HttpClient, Mailer, RecordStore,
};
use crate::runner::RunPipeline;

struct TimerEntry {
    task: JoinHandle<()>,
    paused: Arc<AtomicBool>,
}

/// Owns the cron timers that drive scheduled automations.
pub struct TriggerScheduler<R, L, S, H, M, P> {
    pipeline: Arc<RunPipeline<R, L, S, H, M, P>>,
    timers: Mutex<HashMap<AutomationId, TimerEntry>>,
}

impl<R, L, S, H, M, P> TriggerScheduler<R, L, S, H, M, P>
where
    R: AutomationRepository + Send + Sync + 'static,
    L: ExecutionLogStore + Send + Sync + 'static,
    S: RecordStore,
    H: HttpClient,
    M: Mailer + Send + Sync + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    pub fn new(pipeline: Arc<RunPipeline<R, L, S, H, M, P>>) -> Self {
        Self {
            pipeline,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Register (or silently replace) the timer for one automation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCron`] when the expression does
    /// not parse; the previous timer, if any, is left untouched in that
    /// case.
    #[tracing::instrument(skip(self), fields(automation_id = %id))]
    pub async fn register(&self, id: AutomationId, cron_expr: &str) -> Result<(), RelayError> {
        let schedule = parse_cron(cron_expr)?;

        let paused = Arc::new(AtomicBool::new(false));
        let task = self.spawn_timer(id, schedule, Arc::clone(&paused));

        let mut timers = self.timers.lock().await;
        if let Some(previous) = timers.insert(id, TimerEntry { task, paused }) {
            previous.task.abort();
            tracing::debug!("replaced existing timer");
        }
        Ok(())
    }

    /// Drop the timer for one automation; later fires never happen.
    pub async fn remove(&self, id: AutomationId) {
        let mut timers = self.timers.lock().await;
        if let Some(entry) = timers.remove(&id) {
            entry.task.abort();
            tracing::debug!(automation_id = %id, "timer removed");
        }
    }

    /// Pause the timer without dropping it. Returns false when no timer
    /// exists for the id.
    pub async fn stop(&self, id: AutomationId) -> bool {
        let timers = self.timers.lock().await;
        match timers.get(&id) {
            Some(entry) => {
                entry.paused.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Resume a paused timer. Returns false when no timer exists.
    pub async fn start(&self, id: AutomationId) -> bool {
        let timers = self.timers.lock().await;
        match timers.get(&id) {
            Some(entry) => {
                entry.paused.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Whether a timer (paused or not) exists for the id.
    pub async fn has(&self, id: AutomationId) -> bool {
        self.timers.lock().await.contains_key(&id)
    }

    /// Number of live timers.
    pub async fn len(&self) -> usize {
        self.timers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.timers.lock().await.is_empty()
    }

    /// Register timers for every persisted scheduled+enabled automation,
    /// using the hourly default when no cron is configured. One bad cron
    /// expression never blocks the rest; it is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the repository cannot be read.
    #[tracing::instrument(skip_all)]
    pub async fn reconcile(&self, repo: &R) -> Result<usize, RelayError> {
        let mut registered = 0;
        for automation in repo.get_enabled().await? {
            if !automation.wants_timer() {
                continue;
            }
            match self.register_automation(&automation).await {
                Ok(()) => registered += 1,
                Err(err) => {
                    tracing::warn!(
                        automation_id = %automation.id,
                        error = %err,
                        "skipping automation with unusable schedule"
                    );
                }
            }
        }
        tracing::info!(registered, "scheduler reconciled");
        Ok(registered)
    }

    /// Register using the automation's configured cron or the default.
    ///
    /// # Errors
    ///
    /// Same as [`TriggerScheduler::register`].
    pub async fn register_automation(&self, automation: &Automation) -> Result<(), RelayError> {
        self.register(automation.id, automation.trigger_config.cron_or_default())
            .await
    }

    fn spawn_timer(
        &self,
        id: AutomationId,
        schedule: Schedule,
        paused: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    tracing::debug!(automation_id = %id, "schedule exhausted, timer exiting");
                    break;
                };
                let delay = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                tokio::time::sleep(delay).await;

                if paused.load(Ordering::SeqCst) {
                    continue;
                }

                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    if let Err(err) = pipeline.run(id, json!({ "reason": "cron" }), false).await {
                        tracing::error!(automation_id = %id, error = %err, "scheduled run failed");
                    }
                });
            }
        })
    }
}

impl<R, L, S, H, M, P> Drop for TriggerScheduler<R, L, S, H, M, P> {
    fn drop(&mut self) {
        for entry in self.timers.get_mut().values() {
            entry.task.abort();
        }
    }
}

/// Parse a cron expression, accepting plain 5-field crontab syntax by
/// prepending a seconds field.
fn parse_cron(expr: &str) -> Result<Schedule, ValidationError> {
    let normalized = if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    };
    Schedule::from_str(&normalized).map_err(|err| ValidationError::InvalidCron {
        expr: expr.to_string(),
        reason: err.to_string(),
    })
}
