//! Run pipeline — one end-to-end invocation of an automation.
//!
//! Per run: load the automation, gate on `enabled`, open an execution
//! log, gate on the automation-level condition, then execute the sorted
//! actions one at a time. A failing step aborts the remaining pipeline
//! but never escapes: it is captured into the step log and the run's
//! error status. Completion is announced on the event bus, fire and
//! forget.

use serde_json::{Value, json};

use relay_domain::error::{NotFoundError, RelayError};
use relay_domain::event::{Event, EventType};
use relay_domain::execution::{ExecutionLog, StepLog};
use relay_domain::id::AutomationId;

use crate::context::RunContext;
use crate::executor::ActionExecutor;
use crate::ports::{
    AutomationRepository, EventPublisher, ExecutionLogStore, HttpClient, Mailer, RecordStore,
};

/// Executes automations end to end and records the audit trail.
pub struct RunPipeline<R, L, S, H, M, P> {
    repo: R,
    logs: L,
    executor: ActionExecutor<S, H, M, P>,
    events: P,
}

impl<R, L, S, H, M, P> RunPipeline<R, L, S, H, M, P>
where
    R: AutomationRepository + Send + Sync,
    L: ExecutionLogStore + Send + Sync,
    S: RecordStore,
    H: HttpClient,
    M: Mailer + Send + Sync,
    P: EventPublisher + Clone + Send + Sync,
{
    pub fn new(repo: R, logs: L, records: S, http: H, mailer: M, events: P) -> Self {
        let executor = ActionExecutor::new(records, http, mailer, events.clone());
        Self {
            repo,
            logs,
            executor,
            events,
        }
    }

    /// Override the script sandbox deadline.
    #[must_use]
    pub fn with_script_timeout(mut self, timeout_secs: u64) -> Self {
        self.executor = self.executor.with_script_timeout(timeout_secs);
        self
    }

    /// Run one automation.
    ///
    /// Returns `Ok(None)` when the automation is disabled and this is not
    /// a test run (no execution log is written). Test runs bypass the
    /// enabled gate and all condition gates.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotFound`] for an unknown automation id, or
    /// a storage error from the repositories. Action failures do not
    /// surface here; they finalize the returned log with `error` status.
    #[tracing::instrument(skip(self, event_data), fields(automation_id = %id, is_test))]
    pub async fn run(
        &self,
        id: AutomationId,
        event_data: Value,
        is_test: bool,
    ) -> Result<Option<ExecutionLog>, RelayError> {
        let automation = self.repo.get_by_id(id).await?.ok_or(NotFoundError {
            entity: "Automation",
            id: id.to_string(),
        })?;

        if !automation.enabled && !is_test {
            tracing::debug!("automation disabled, skipping run");
            return Ok(None);
        }

        let log = self
            .logs
            .create_run(ExecutionLog::started(id, event_data.clone(), is_test))
            .await?;

        let mut context = RunContext::new(event_data.clone());
        if let Some(record) = event_data.get("record").filter(|r| r.is_object()) {
            context = context.with_record(record.clone());
        }

        if !is_test && !relay_domain::automation::passes(automation.condition.as_ref(), context.as_value()) {
            // Deliberately a successful run: the rule was consulted and
            // declined to act.
            let log = self
                .logs
                .finalize_run(
                    log.succeeded(json!({ "message": "Condition not met, no actions performed" })),
                )
                .await?;
            self.notify_completed(&log).await;
            return Ok(Some(log));
        }

        for action in automation.actions_in_order() {
            if !is_test
                && !relay_domain::automation::passes(action.condition.as_ref(), context.as_value())
            {
                let step = StepLog::success(
                    log.id,
                    action.id,
                    json!({ "skipped": true, "message": "Step skipped: condition not met" }),
                    Vec::new(),
                );
                self.logs.append_step(step).await?;
                continue;
            }

            match self.executor.execute(&action.kind, &context).await {
                Ok(output) => {
                    context.record_step_result(action.id, output.result.clone());
                    self.logs
                        .append_step(StepLog::success(log.id, action.id, output.result, output.console))
                        .await?;
                }
                Err(failure) => {
                    let message = failure.error.to_string();
                    tracing::warn!(
                        action = %action.kind,
                        error = %message,
                        "action failed, aborting remaining pipeline"
                    );
                    self.logs
                        .append_step(StepLog::error(log.id, action.id, &message, failure.console))
                        .await?;
                    let log = self.logs.finalize_run(log.failed(message)).await?;
                    self.notify_completed(&log).await;
                    return Ok(Some(log));
                }
            }
        }

        let log = self
            .logs
            .finalize_run(log.succeeded(context.into_value()))
            .await?;
        self.notify_completed(&log).await;
        Ok(Some(log))
    }

    async fn notify_completed(&self, log: &ExecutionLog) {
        let event = Event::new(
            EventType::RunCompleted,
            Some(log.automation_id),
            json!({
                "executionId": log.id,
                "status": log.status,
                "error": log.error,
            }),
        );
        if let Err(err) = self.events.publish(event).await {
            tracing::warn!(error = %err, "run completion publish failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use relay_domain::automation::{
        Action, ActionKind, Automation, CallApiParams, Compare, Predicate, ScriptParams,
        TriggerType,
    };
    use relay_domain::execution::RunStatus;

    use crate::event_bus::InProcessEventBus;
    use crate::test_support::{FakeHttp, FakeMailer, FakeRecords, InMemoryAutomationRepo, InMemoryLogStore};

    type TestPipeline = RunPipeline<
        InMemoryAutomationRepo,
        InMemoryLogStore,
        FakeRecords,
        FakeHttp,
        FakeMailer,
        InProcessEventBus,
    >;

    struct Harness {
        pipeline: TestPipeline,
        repo: InMemoryAutomationRepo,
        logs: InMemoryLogStore,
        bus: InProcessEventBus,
    }

    fn harness() -> Harness {
        let repo = InMemoryAutomationRepo::default();
        let logs = InMemoryLogStore::default();
        let bus = InProcessEventBus::new(16);
        let pipeline = RunPipeline::new(
            repo.clone(),
            logs.clone(),
            FakeRecords::default(),
            FakeHttp::default(),
            FakeMailer::default(),
            bus.clone(),
        );
        Harness {
            pipeline,
            repo,
            logs,
            bus,
        }
    }

    fn script_action(order: i64, script: &str) -> Action {
        Action::new(
            order,
            ActionKind::RunScript(ScriptParams {
                script: script.to_string(),
            }),
        )
    }

    async fn save(repo: &InMemoryAutomationRepo, automation: Automation) -> AutomationId {
        let id = automation.id;
        repo.create(automation).await.unwrap();
        id
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_fail_with_not_found_for_unknown_automation() {
        let h = harness();
        let result = h.pipeline.run(AutomationId::new(), json!({}), false).await;
        assert!(matches!(result, Err(RelayError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_skip_disabled_automation_without_logging() {
        let h = harness();
        let mut automation = Automation::builder()
            .name("Disabled")
            .action(script_action(1, "return 1"))
            .build()
            .unwrap();
        automation.enabled = false;
        let id = save(&h.repo, automation).await;

        let outcome = h.pipeline.run(id, json!({}), false).await.unwrap();
        assert!(outcome.is_none());
        assert!(h.logs.runs.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_execute_actions_in_ascending_order() {
        let h = harness();
        let automation = Automation::builder()
            .name("Ordered")
            .action(script_action(2, "return 20"))
            .action(script_action(1, "return 10"))
            .action(script_action(3, "return 30"))
            .build()
            .unwrap();
        let id = save(&h.repo, automation).await;

        let log = h.pipeline.run(id, json!({}), false).await.unwrap().unwrap();
        assert_eq!(log.status, RunStatus::Success);

        let steps = h.logs.steps.lock().unwrap();
        let results: Vec<_> = steps.iter().map(|s| s.result.clone().unwrap()).collect();
        assert_eq!(results, vec![json!(10), json!(20), json!(30)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_abort_remaining_actions_when_one_fails() {
        let h = harness();
        let automation = Automation::builder()
            .name("Fails midway")
            .action(script_action(1, "return 10"))
            .action(script_action(2, r#"throw "boom""#))
            .action(script_action(3, "return 30"))
            .build()
            .unwrap();
        let id = save(&h.repo, automation).await;

        let log = h.pipeline.run(id, json!({}), false).await.unwrap().unwrap();
        assert_eq!(log.status, RunStatus::Error);
        assert!(log.error.as_deref().unwrap().contains("boom"));
        assert!(log.result.is_none());

        let steps = h.logs.steps.lock().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].status, RunStatus::Success);
        assert_eq!(steps[1].status, RunStatus::Error);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_finalize_vacuous_success_when_condition_is_false() {
        let h = harness();
        let automation = Automation::builder()
            .name("Gated")
            .condition(Predicate::Leaf {
                field: "status".to_string(),
                compare: Compare::Equals,
                value: json!("active"),
            })
            .action(script_action(1, "return 1"))
            .build()
            .unwrap();
        let id = save(&h.repo, automation).await;

        let log = h
            .pipeline
            .run(id, json!({"status": "inactive"}), false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(log.status, RunStatus::Success);
        assert_eq!(
            log.result.unwrap()["message"],
            json!("Condition not met, no actions performed")
        );
        assert!(h.logs.steps.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_bypass_gates_on_test_run() {
        let h = harness();
        let mut automation = Automation::builder()
            .name("Gated and disabled")
            .condition(Predicate::Leaf {
                field: "status".to_string(),
                compare: Compare::Equals,
                value: json!("never"),
            })
            .action(script_action(1, "return 1"))
            .build()
            .unwrap();
        automation.enabled = false;
        let id = save(&h.repo, automation).await;

        let log = h.pipeline.run(id, json!({}), true).await.unwrap().unwrap();
        assert_eq!(log.status, RunStatus::Success);
        assert!(log.is_test);
        assert_eq!(h.logs.steps.lock().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_log_skipped_step_as_success_and_continue() {
        let h = harness();
        let gated = script_action(1, "return 1").with_condition(Predicate::Leaf {
            field: "go".to_string(),
            compare: Compare::Equals,
            value: json!(true),
        });
        let automation = Automation::builder()
            .name("Step gated")
            .action(gated)
            .action(script_action(2, "return 2"))
            .build()
            .unwrap();
        let id = save(&h.repo, automation).await;

        let log = h
            .pipeline
            .run(id, json!({"go": false}), false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(log.status, RunStatus::Success);

        let steps = h.logs.steps.lock().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].status, RunStatus::Success);
        assert_eq!(steps[0].result.as_ref().unwrap()["skipped"], json!(true));
        assert_eq!(steps[1].result, Some(json!(2)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_expose_earlier_step_results_to_later_steps() {
        let h = harness();
        let first = script_action(1, "return 21");
        let first_id = first.id;
        let second = script_action(
            2,
            &format!(r#"return context["step_{first_id}_result"] * 2"#),
        );
        let automation = Automation::builder()
            .name("Chained")
            .action(first)
            .action(second)
            .build()
            .unwrap();
        let id = save(&h.repo, automation).await;

        let log = h.pipeline.run(id, json!({}), false).await.unwrap().unwrap();
        assert_eq!(log.status, RunStatus::Success);

        let steps = h.logs.steps.lock().unwrap();
        assert_eq!(steps[1].result, Some(json!(42)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_publish_run_completed_event() {
        let h = harness();
        let mut rx = h.bus.subscribe();
        let automation = Automation::builder()
            .name("Announced")
            .action(script_action(1, "return 1"))
            .build()
            .unwrap();
        let id = save(&h.repo, automation).await;

        h.pipeline.run(id, json!({}), false).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::RunCompleted);
        assert_eq!(event.automation_id, Some(id));
        assert_eq!(event.payload["status"], json!("success"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_fail_fast_on_missing_action_param() {
        let h = harness();
        let automation = Automation::builder()
            .name("Bad callAPI")
            .action(Action::new(
                1,
                ActionKind::CallApi(CallApiParams {
                    url: String::new(),
                    method: "POST".to_string(),
                    payload: Value::Null,
                }),
            ))
            .build()
            .unwrap();
        let id = save(&h.repo, automation).await;

        let log = h.pipeline.run(id, json!({}), false).await.unwrap().unwrap();
        assert_eq!(log.status, RunStatus::Error);
        assert_eq!(log.error.as_deref(), Some("callAPI requires url"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn should_evaluate_condition_against_triggering_record() {
        let h = harness();
        let automation = Automation::builder()
            .name("Record gated")
            .trigger_type(TriggerType::Create)
            .condition(Predicate::Leaf {
                field: "priority".to_string(),
                compare: Compare::Gte,
                value: json!(5),
            })
            .action(script_action(1, "return context.record.priority"))
            .build()
            .unwrap();
        let id = save(&h.repo, automation).await;

        let log = h
            .pipeline
            .run(id, json!({"record": {"priority": 8}}), false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(log.status, RunStatus::Success);
        let steps = h.logs.steps.lock().unwrap();
        assert_eq!(steps[0].result, Some(json!(8)));
    }
}
