//! # relay-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AutomationRepository` — CRUD for automations
//!   - `ExecutionLogStore` — append & finalize run and step logs
//!   - `RecordStore` — table/record storage reached by actions and scripts
//!   - `HttpClient` — outbound HTTP for callAPI, sendSlack and script fetch
//!   - `Mailer` — outbound email for sendEmail
//!   - `EventPublisher` — engine event fan-out
//! - Define **driving/inbound ports** as use-case structs:
//!   - `AutomationService` — CRUD plus timer reconciliation
//!   - `RunPipeline` — execute one automation end to end
//!   - `TriggerScheduler` — cron timers for scheduled automations
//! - Provide **in-process infrastructure** (event bus, script sandbox)
//!   that doesn't need IO adapters
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `relay-domain` only (plus `tokio::sync` for channels and the
//! sandbox/scheduler runtimes). Never imports adapter crates. Adapters
//! depend on *this* crate, not the reverse.

pub mod context;
pub mod event_bus;
pub mod executor;
pub mod ports;
pub mod runner;
pub mod sandbox;
pub mod scheduler;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;
