//! Project read model.

use crate::model::progress::ProjectProgress;
use crate::model::status::Status;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Persisted project with its derived fields.
///
/// `status` and `completion_progress` are outputs of the progress aggregator;
/// there is no API that writes them from caller input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub uuid: ProjectId,
    pub name: String,
    pub status: Status,
    pub completion_progress: f64,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Project {
    pub fn progress(&self) -> ProjectProgress {
        ProjectProgress {
            status: self.status,
            completion_progress: self.completion_progress,
        }
    }
}
