//! Domain model for projects, tasks and derived progress.
//!
//! # Responsibility
//! - Define the records the dependency engine reads and writes.
//! - Keep field-level validation next to the types it protects.
//!
//! # Invariants
//! - Every project and task is identified by a stable, non-nil UUID.
//! - Project status/progress only ever come from `ProjectProgress::derive`.

pub mod progress;
pub mod project;
pub mod status;
pub mod task;
pub mod validation;
