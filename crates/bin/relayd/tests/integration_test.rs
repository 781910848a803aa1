//! End-to-end tests wiring real adapters into the engine.

use std::sync::Arc;

use serde_json::json;

use relay_adapter_outbound_reqwest::{ReqwestHttpClient, TracingMailer};
use relay_adapter_storage_memory::{MemoryAutomationRepo, MemoryLogStore, MemoryRecordStore};
use relay_app::event_bus::InProcessEventBus;
use relay_app::ports::ExecutionLogStore;
use relay_app::runner::RunPipeline;
use relay_app::scheduler::TriggerScheduler;
use relay_app::services::AutomationService;
use relay_domain::automation::{
    Action, ActionKind, Automation, Compare, CreateRecordParams, Predicate, ScriptParams,
    TriggerType,
};
use relay_domain::execution::RunStatus;

type Service = AutomationService<
    MemoryAutomationRepo,
    MemoryLogStore,
    MemoryRecordStore,
    ReqwestHttpClient,
    TracingMailer,
    InProcessEventBus,
>;

type Scheduler = TriggerScheduler<
    MemoryAutomationRepo,
    MemoryLogStore,
    MemoryRecordStore,
    ReqwestHttpClient,
    TracingMailer,
    InProcessEventBus,
>;

struct Stack {
    service: Service,
    scheduler: Arc<Scheduler>,
    records: MemoryRecordStore,
    logs: MemoryLogStore,
}

fn stack() -> Stack {
    let repo = MemoryAutomationRepo::new();
    let logs = MemoryLogStore::new();
    let records = MemoryRecordStore::new();
    let bus = InProcessEventBus::new(64);

    let pipeline = Arc::new(
        RunPipeline::new(
            repo.clone(),
            logs.clone(),
            records.clone(),
            ReqwestHttpClient::new(),
            TracingMailer::new(),
            bus.clone(),
        )
        .with_script_timeout(5),
    );
    let scheduler = Arc::new(TriggerScheduler::new(Arc::clone(&pipeline)));
    let service = AutomationService::new(repo, pipeline, Arc::clone(&scheduler), bus);

    Stack {
        service,
        scheduler,
        records,
        logs,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn should_run_record_pipeline_end_to_end() {
    let stack = stack();

    let create_record = Action::new(
        1,
        ActionKind::CreateRecord(CreateRecordParams {
            table_name: "Tasks".to_string(),
            fields: serde_json::from_value(json!({"title": "from automation"})).unwrap(),
        }),
    );
    let read_back = Action::new(
        2,
        ActionKind::RunScript(ScriptParams {
            script: r#"
                let rows = base.getTable("Tasks").selectRecordsAsync();
                return rows.len();
            "#
            .to_string(),
        }),
    );

    let automation = Automation::builder()
        .name("Create and count")
        .action(create_record)
        .action(read_back)
        .build()
        .unwrap();
    let id = automation.id;

    stack.service.create_automation(automation).await.unwrap();
    let log = stack
        .service
        .run_automation(id, json!({"reason": "manual"}))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(log.status, RunStatus::Success);

    let steps = stack.logs.steps_for(log.id).await.unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1].result, Some(json!(1)));

    use relay_app::ports::RecordStore;
    let rows = stack.records.list("Tasks").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cell_value("title"), json!("from automation"));
}

#[tokio::test(flavor = "multi_thread")]
async fn should_record_failed_run_with_error_message() {
    let stack = stack();

    let automation = Automation::builder()
        .name("Throws")
        .action(Action::new(
            1,
            ActionKind::RunScript(ScriptParams {
                script: r#"throw "integration boom""#.to_string(),
            }),
        ))
        .build()
        .unwrap();
    let id = automation.id;

    stack.service.create_automation(automation).await.unwrap();
    let log = stack
        .service
        .run_automation(id, json!({}))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(log.status, RunStatus::Error);
    assert!(log.error.as_deref().unwrap().contains("integration boom"));
}

#[tokio::test(flavor = "multi_thread")]
async fn should_manage_timer_lifecycle_through_service() {
    let stack = stack();

    let automation = Automation::builder()
        .name("Hourly")
        .trigger_type(TriggerType::Scheduled)
        .cron("0 * * * *")
        .action(Action::new(
            1,
            ActionKind::RunScript(ScriptParams {
                script: "return 1".to_string(),
            }),
        ))
        .build()
        .unwrap();
    let id = automation.id;

    stack.service.create_automation(automation).await.unwrap();
    assert!(stack.scheduler.has(id).await);

    stack.service.set_enabled(id, false).await.unwrap();
    assert!(stack.scheduler.has(id).await);

    stack.service.set_enabled(id, true).await.unwrap();
    assert_eq!(stack.scheduler.len().await, 1);

    stack.service.delete_automation(id).await.unwrap();
    assert!(!stack.scheduler.has(id).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn should_fan_record_event_through_condition_gate() {
    let stack = stack();

    let automation = Automation::builder()
        .name("High priority only")
        .trigger_type(TriggerType::Create)
        .table("Tasks")
        .condition(Predicate::Leaf {
            field: "priority".to_string(),
            compare: Compare::Gte,
            value: json!(5),
        })
        .action(Action::new(
            1,
            ActionKind::RunScript(ScriptParams {
                script: "return context.record.priority".to_string(),
            }),
        ))
        .build()
        .unwrap();
    let id = automation.id;
    stack.service.create_automation(automation).await.unwrap();

    stack
        .service
        .handle_record_event("Tasks", TriggerType::Create, json!({"priority": 9}))
        .await
        .unwrap();
    stack
        .service
        .handle_record_event("Tasks", TriggerType::Create, json!({"priority": 1}))
        .await
        .unwrap();

    let runs = stack.logs.runs_for(id).await.unwrap();
    assert_eq!(runs.len(), 2);

    // Most recent first: the low-priority event was a vacuous success.
    assert_eq!(runs[0].status, RunStatus::Success);
    assert_eq!(
        runs[0].result.as_ref().unwrap()["message"],
        json!("Condition not met, no actions performed")
    );
    let steps = stack.logs.steps_for(runs[1].id).await.unwrap();
    assert_eq!(steps[0].result, Some(json!(9)));
}
