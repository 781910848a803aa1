//! Application services — the engine's driving ports.

pub mod automation_service;

pub use automation_service::AutomationService;
