//! Field validation for caller-supplied project and task data.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Validation errors for project/task fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifiers must not be nil.
    NilId,
    /// Name is empty after trimming.
    EmptyName,
    /// Weight must be a positive integer.
    NonPositiveWeight(i64),
    /// Weight exceeds `MAX_WEIGHT`.
    WeightTooLarge(i64),
    /// Status string is not one of `draft|in_progress|done`.
    UnknownStatus(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "id must not be nil"),
            Self::EmptyName => write!(f, "name must not be blank"),
            Self::NonPositiveWeight(weight) => {
                write!(f, "weight must be a positive integer, got {weight}")
            }
            Self::WeightTooLarge(weight) => {
                write!(f, "weight must be at most {MAX_WEIGHT}, got {weight}")
            }
            Self::UnknownStatus(value) => write!(
                f,
                "unknown status `{value}`; expected draft|in_progress|done"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and rejects blank names.
pub fn normalize_name(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Largest accepted task weight.
///
/// Keeps per-project weight sums far below `i64::MAX`.
pub const MAX_WEIGHT: i64 = i32::MAX as i64;

/// Accepts weights in `1..=MAX_WEIGHT`.
pub fn validate_weight(weight: i64) -> Result<i64, ValidationError> {
    if weight < 1 {
        return Err(ValidationError::NonPositiveWeight(weight));
    }
    if weight > MAX_WEIGHT {
        return Err(ValidationError::WeightTooLarge(weight));
    }
    Ok(weight)
}

pub fn validate_id(id: Uuid) -> Result<Uuid, ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::NilId);
    }
    Ok(id)
}
