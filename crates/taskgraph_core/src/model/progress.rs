//! Project status/progress derivation.
//!
//! # Responsibility
//! - Turn an aggregate snapshot of a project's tasks into the project's
//!   derived `status` and `completion_progress`.
//!
//! # Invariants
//! - Pure function of `TaskStats`; persistence lives in the service layer.
//! - `completion_progress` is always within `[0, 100]`.

use crate::model::status::Status;
use serde::{Deserialize, Serialize};

/// Aggregate counts/sums over one project's tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: i64,
    pub done: i64,
    pub draft: i64,
    pub done_weight: i64,
    pub total_weight: i64,
}

/// Derived project fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectProgress {
    pub status: Status,
    pub completion_progress: f64,
}

impl ProjectProgress {
    /// Progress of a project without tasks.
    pub const EMPTY: Self = Self {
        status: Status::Draft,
        completion_progress: 0.0,
    };

    /// Derives project status/progress.
    ///
    /// Rules, first match wins:
    /// 1. no tasks -> `draft`, 0
    /// 2. every task done -> `done`, 100
    /// 3. any draft task -> `draft`, weighted done ratio
    /// 4. otherwise -> `in_progress`, weighted done ratio
    pub fn derive(stats: &TaskStats) -> Self {
        if stats.total == 0 {
            return Self::EMPTY;
        }
        if stats.done == stats.total {
            return Self {
                status: Status::Done,
                completion_progress: 100.0,
            };
        }

        let status = if stats.draft > 0 {
            Status::Draft
        } else {
            Status::InProgress
        };
        Self {
            status,
            completion_progress: weighted_ratio(stats.done_weight, stats.total_weight),
        }
    }
}

// total_weight > 0 whenever total > 0 because every weight is >= 1; the guard
// keeps a corrupted store from producing NaN/inf.
fn weighted_ratio(done_weight: i64, total_weight: i64) -> f64 {
    if total_weight <= 0 {
        return 0.0;
    }
    let ratio = (done_weight as f64 * 100.0) / total_weight as f64;
    ratio.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::{ProjectProgress, TaskStats};
    use crate::model::status::Status;

    fn stats(total: i64, done: i64, draft: i64, done_weight: i64, total_weight: i64) -> TaskStats {
        TaskStats {
            total,
            done,
            draft,
            done_weight,
            total_weight,
        }
    }

    #[test]
    fn empty_project_is_draft_at_zero() {
        assert_eq!(
            ProjectProgress::derive(&TaskStats::default()),
            ProjectProgress::EMPTY
        );
    }

    #[test]
    fn all_done_wins_over_weights() {
        let progress = ProjectProgress::derive(&stats(2, 2, 0, 10, 10));
        assert_eq!(progress.status, Status::Done);
        assert_eq!(progress.completion_progress, 100.0);
    }

    #[test]
    fn any_draft_keeps_project_draft_with_weighted_progress() {
        let progress = ProjectProgress::derive(&stats(3, 1, 1, 4, 16));
        assert_eq!(progress.status, Status::Draft);
        assert_eq!(progress.completion_progress, 25.0);
    }

    #[test]
    fn no_draft_and_not_all_done_is_in_progress() {
        let progress = ProjectProgress::derive(&stats(2, 1, 0, 4, 10));
        assert_eq!(progress.status, Status::InProgress);
        assert_eq!(progress.completion_progress, 40.0);
    }

    #[test]
    fn zero_total_weight_guard_yields_zero() {
        let progress = ProjectProgress::derive(&stats(1, 0, 0, 0, 0));
        assert_eq!(progress.status, Status::InProgress);
        assert_eq!(progress.completion_progress, 0.0);
    }
}
