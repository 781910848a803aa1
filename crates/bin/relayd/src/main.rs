//! # relayd — automation engine daemon
//!
//! Composition root that wires the adapters into the engine and runs it.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct storage and outbound adapters
//! - Construct the run pipeline, scheduler, and automation service,
//!   injecting adapters via port traits
//! - Reconcile scheduler timers against persisted automations
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use relay_adapter_outbound_reqwest::{ReqwestHttpClient, TracingMailer};
use relay_adapter_storage_memory::{MemoryAutomationRepo, MemoryLogStore, MemoryRecordStore};
use relay_app::event_bus::InProcessEventBus;
use relay_app::runner::RunPipeline;
use relay_app::scheduler::TriggerScheduler;
use relay_app::services::AutomationService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Adapters
    let repo = MemoryAutomationRepo::new();
    let logs = MemoryLogStore::new();
    let records = MemoryRecordStore::new();
    let http = ReqwestHttpClient::new();
    let mailer = TracingMailer::new();

    // Event bus
    let event_bus = InProcessEventBus::new(config.engine.event_capacity);

    // Engine
    let pipeline = Arc::new(
        RunPipeline::new(
            repo.clone(),
            logs,
            records,
            http,
            mailer,
            event_bus.clone(),
        )
        .with_script_timeout(config.engine.script_timeout_secs),
    );
    let scheduler = Arc::new(TriggerScheduler::new(Arc::clone(&pipeline)));
    scheduler.reconcile(&repo).await?;

    let service = AutomationService::new(repo, pipeline, scheduler, event_bus.clone());
    let automations = service.list_automations().await?;
    tracing::info!(count = automations.len(), "automation engine started");

    // Surface engine events in the log until an inbound adapter owns them.
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!(
                event_type = ?event.event_type,
                automation_id = ?event.automation_id,
                "engine event"
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
