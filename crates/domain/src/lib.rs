//! # relay-domain
//!
//! Pure domain model for the relay automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Automations** (trigger → condition → ordered action pipeline)
//! - Define **Actions** (typed steps with per-type parameter structs)
//! - Define **Predicates** (AND/OR trees of field comparisons) and their
//!   pure evaluator
//! - Define **Execution logs** (per-run and per-step audit records)
//! - Define **Records** (table-shaped data that actions and scripts touch)
//! - Define **Events** (change notifications broadcast to listeners)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod event;
pub mod execution;
pub mod record;
