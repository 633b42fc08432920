//! Core use-case services and the dependency engine.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own the graph rules: dependency validation/sync, done-eligibility, the
//!   dependent cascade and project progress aggregation.
//!
//! The engine functions (`dependency_graph`, `eligibility`, `progress`) are
//! generic over repository traits; `TaskService`/`ProjectService` bind them to
//! SQLite and wrap every mutation in one transaction.

pub mod dependency_graph;
pub mod eligibility;
pub mod error;
pub mod progress;
pub mod project_service;
pub mod task_service;
mod unit_of_work;
