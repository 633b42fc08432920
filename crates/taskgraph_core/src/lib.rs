//! Core domain logic for the task dependency graph and project progress engine.
//! This crate is the single source of truth for graph and progress invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::progress::{ProjectProgress, TaskStats};
pub use model::project::{Project, ProjectId};
pub use model::status::Status;
pub use model::task::{Task, TaskId, TaskRecord, TaskRef};
pub use model::validation::{ValidationError, MAX_WEIGHT};
pub use repo::project_repo::{ProjectListQuery, ProjectRepository, SqliteProjectRepository};
pub use repo::task_repo::{
    DependencyDiff, SqliteTaskRepository, TaskListQuery, TaskRepository,
};
pub use repo::{ensure_schema_ready, RepoError, RepoResult};
pub use service::dependency_graph::{sync_dependencies, validate_dependencies};
pub use service::eligibility::{
    can_be_marked_done, ensure_can_be_marked_done, revalidate_dependents,
};
pub use service::error::{ErrorKind, ServiceError};
pub use service::progress::recalc_project;
pub use service::project_service::ProjectService;
pub use service::task_service::{CreateTaskRequest, TaskService, UpdateTaskRequest};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
