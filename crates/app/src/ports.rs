//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod automation_repo;
pub mod event_bus;
pub mod log_store;
pub mod outbound;
pub mod record_store;

pub use automation_repo::AutomationRepository;
pub use event_bus::EventPublisher;
pub use log_store::ExecutionLogStore;
pub use outbound::{HttpClient, HttpResponse, Mailer};
pub use record_store::RecordStore;
