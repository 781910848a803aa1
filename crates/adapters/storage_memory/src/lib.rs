//! # relay-adapter-storage-memory
//!
//! In-memory implementations of the storage ports. State lives in
//! process memory behind `Arc<Mutex<…>>`, so clones of one store share
//! the same data and everything is lost on shutdown. Suitable for
//! development, demos, and tests; a durable deployment swaps in a
//! database-backed adapter implementing the same ports.

mod automation_repo;
mod log_store;
mod record_store;

pub use automation_repo::MemoryAutomationRepo;
pub use log_store::MemoryLogStore;
pub use record_store::MemoryRecordStore;
