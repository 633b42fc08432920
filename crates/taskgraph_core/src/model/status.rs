//! Lifecycle status shared by tasks and projects.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Lifecycle state for tasks, and the derived state of projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Created but not started.
    Draft,
    /// Work has started.
    InProgress,
    /// Completed.
    Done,
}

impl Status {
    /// Storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Parses the exact storage representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn is_done(self) -> bool {
        self == Self::Done
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse for caller input: surrounding whitespace and ASCII case are
/// ignored.
impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim().to_ascii_lowercase().as_str())
            .ok_or_else(|| ValidationError::UnknownStatus(value.to_string()))
    }
}
