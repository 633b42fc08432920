//! Dependency graph validation and edge-set replacement.
//!
//! # Responsibility
//! - Reject dependency sets that break the graph invariants.
//! - Replace a task's stored edge set once the candidate set is accepted.
//!
//! # Invariants
//! - No task depends on itself.
//! - Every dependency belongs to the task's project.
//! - The stored dependency relation stays acyclic.
//! - Validation is read-only; sync mutates nothing when validation fails.

use crate::model::task::{TaskId, TaskRef};
use crate::repo::task_repo::{DependencyDiff, TaskRepository};
use crate::repo::RepoResult;
use crate::service::error::ServiceError;
use log::debug;
use std::collections::{BTreeSet, HashSet};

/// Checks that `task` may depend on every id in `candidates`.
///
/// `task.project_uuid` is the project the task will belong to after the
/// surrounding write, which may differ from the stored one on a move.
///
/// Checks run in order: self reference, unknown ids, cross-project ids,
/// cycles.
pub fn validate_dependencies<R: TaskRepository + ?Sized>(
    repo: &R,
    task: &TaskRef,
    candidates: &BTreeSet<TaskId>,
) -> Result<(), ServiceError> {
    if candidates.contains(&task.uuid) {
        return Err(ServiceError::SelfDependency(task.uuid));
    }

    let resolved = repo.task_projects(candidates)?;
    if let Some(unknown) = candidates.iter().find(|id| !resolved.contains_key(*id)) {
        return Err(ServiceError::UnknownDependency(*unknown));
    }

    if let Some((dependency_uuid, _)) = resolved
        .iter()
        .find(|(_, project_uuid)| **project_uuid != task.project_uuid)
    {
        return Err(ServiceError::CrossProjectDependency {
            task_uuid: task.uuid,
            dependency_uuid: *dependency_uuid,
        });
    }

    if reaches(repo, candidates, task.uuid)? {
        return Err(ServiceError::CircularDependency(task.uuid));
    }

    Ok(())
}

/// Validates `dependency_ids` and makes them the complete dependency set of
/// `task`.
///
/// Duplicates are collapsed. Must run inside the caller's unit of work so a
/// later failure also rolls back the edge changes.
pub fn sync_dependencies<R: TaskRepository + ?Sized>(
    repo: &R,
    task: &TaskRef,
    dependency_ids: &[TaskId],
) -> Result<DependencyDiff, ServiceError> {
    let candidates: BTreeSet<TaskId> = dependency_ids.iter().copied().collect();
    validate_dependencies(repo, task, &candidates)?;

    let diff = repo.replace_dependencies(task.uuid, &candidates)?;
    debug!(
        "event=dependency_sync module=service status=ok task_id={} added={} removed={} total={}",
        task.uuid,
        diff.added.len(),
        diff.removed.len(),
        candidates.len()
    );
    Ok(diff)
}

/// Returns whether `target` is reachable from any of `starts` by following
/// stored dependency edges.
///
/// Each node is expanded at most once, so the answer does not depend on the
/// order in which the worklist is drained.
fn reaches<R: TaskRepository + ?Sized>(
    repo: &R,
    starts: &BTreeSet<TaskId>,
    target: TaskId,
) -> RepoResult<bool> {
    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut worklist: Vec<TaskId> = starts.iter().copied().collect();

    while let Some(current) = worklist.pop() {
        if current == target {
            return Ok(true);
        }
        if !visited.insert(current) {
            continue;
        }
        worklist.extend(
            repo.dependency_ids(current)?
                .into_iter()
                .filter(|next| !visited.contains(next)),
        );
    }

    Ok(false)
}
