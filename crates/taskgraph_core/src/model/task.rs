//! Task records and read models.
//!
//! # Invariants
//! - `weight >= 1` and `name` is non-blank for every persisted task.
//! - `dependency_ids` never contains the task itself and only references
//!   tasks of the same project.

use crate::model::project::ProjectId;
use crate::model::status::Status;
use crate::model::validation::{normalize_name, validate_id, validate_weight, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Writable task columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub uuid: TaskId,
    pub project_uuid: ProjectId,
    pub name: String,
    pub status: Status,
    pub weight: i64,
}

impl TaskRecord {
    /// Builds a record with a fresh id, normalizing and validating fields.
    pub fn new(
        project_uuid: ProjectId,
        name: &str,
        status: Status,
        weight: i64,
    ) -> Result<Self, ValidationError> {
        let record = Self {
            uuid: Uuid::new_v4(),
            project_uuid,
            name: normalize_name(name)?,
            status,
            weight: validate_weight(weight)?,
        };
        Ok(record)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id(self.uuid)?;
        validate_id(self.project_uuid)?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        validate_weight(self.weight)?;
        Ok(())
    }

    pub fn task_ref(&self) -> TaskRef {
        TaskRef {
            uuid: self.uuid,
            project_uuid: self.project_uuid,
        }
    }
}

/// Identity plus owning project; enough to walk and validate the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskRef {
    pub uuid: TaskId,
    pub project_uuid: ProjectId,
}

/// Persisted task with its current dependency set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: TaskId,
    pub project_uuid: ProjectId,
    pub name: String,
    pub status: Status,
    pub weight: i64,
    /// Sorted ascending.
    pub dependency_ids: Vec<TaskId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Task {
    pub fn task_ref(&self) -> TaskRef {
        TaskRef {
            uuid: self.uuid,
            project_uuid: self.project_uuid,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }
}
