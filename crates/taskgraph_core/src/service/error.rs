//! Service-level error taxonomy.
//!
//! # Invariants
//! - Every failure maps to exactly one `ErrorKind`.
//! - Repository not-found/validation errors surface as their semantic kind,
//!   never as `StorageFailure`.

use crate::db::DbError;
use crate::model::project::ProjectId;
use crate::model::task::TaskId;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable discriminant for transport-layer mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ValidationFailed,
    SelfDependency,
    UnknownDependency,
    CrossProjectDependency,
    CircularDependency,
    DependenciesNotDone,
    StorageFailure,
}

impl ErrorKind {
    /// Machine-readable code, also used as `error_code=` in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::ValidationFailed => "validation_failed",
            Self::SelfDependency => "self_dependency",
            Self::UnknownDependency => "unknown_dependency",
            Self::CrossProjectDependency => "cross_project_dependency",
            Self::CircularDependency => "circular_dependency",
            Self::DependenciesNotDone => "dependencies_not_done",
            Self::StorageFailure => "storage_failure",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from project/task service operations.
#[derive(Debug)]
pub enum ServiceError {
    ProjectNotFound(ProjectId),
    TaskNotFound(TaskId),
    Validation(ValidationError),
    /// Task listed itself as a dependency.
    SelfDependency(TaskId),
    /// Candidate dependency id does not resolve to a task.
    UnknownDependency(TaskId),
    /// Edge would connect tasks of different projects.
    CrossProjectDependency {
        task_uuid: TaskId,
        dependency_uuid: TaskId,
    },
    /// Candidate edges would make the task reachable from itself.
    CircularDependency(TaskId),
    /// Task cannot be `done` while `pending` dependencies are not `done`.
    DependenciesNotDone { task_uuid: TaskId, pending: u64 },
    /// The store failed to complete the unit of work.
    Storage(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProjectNotFound(_) | Self::TaskNotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::ValidationFailed,
            Self::SelfDependency(_) => ErrorKind::SelfDependency,
            Self::UnknownDependency(_) => ErrorKind::UnknownDependency,
            Self::CrossProjectDependency { .. } => ErrorKind::CrossProjectDependency,
            Self::CircularDependency(_) => ErrorKind::CircularDependency,
            Self::DependenciesNotDone { .. } => ErrorKind::DependenciesNotDone,
            Self::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::SelfDependency(id) => write!(f, "task {id} cannot depend on itself"),
            Self::UnknownDependency(id) => write!(f, "dependency task not found: {id}"),
            Self::CrossProjectDependency {
                task_uuid,
                dependency_uuid,
            } => write!(
                f,
                "task {task_uuid} and dependency {dependency_uuid} belong to different projects"
            ),
            Self::CircularDependency(id) => {
                write!(f, "dependencies would create a cycle through task {id}")
            }
            Self::DependenciesNotDone { task_uuid, pending } => write!(
                f,
                "task {task_uuid} has {pending} dependencies that are not done"
            ),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Storage(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Storage(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(RepoError::from(value))
    }
}
