//! Done-eligibility checks and the dependent cascade.
//!
//! # Responsibility
//! - Decide whether a task may be `done`.
//! - Demote dependents that lost eligibility after a prerequisite left
//!   `done`, transitively.
//!
//! # Invariants
//! - A task is `done` only if every direct dependency is `done`.
//! - The cascade walks an explicit queue; it never recurses.

use crate::model::status::Status;
use crate::model::task::TaskId;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use crate::service::error::ServiceError;
use crate::service::progress::recalc_project;
use log::info;
use std::collections::VecDeque;

/// Returns `true` when none of the task's dependencies is unfinished.
///
/// Vacuously `true` for a task without dependencies.
pub fn can_be_marked_done<R: TaskRepository + ?Sized>(
    repo: &R,
    task_uuid: TaskId,
) -> RepoResult<bool> {
    Ok(repo.count_unfinished_dependencies(task_uuid)? == 0)
}

/// Fails with `DependenciesNotDone` unless `task_uuid` is eligible for `done`.
pub fn ensure_can_be_marked_done<R: TaskRepository + ?Sized>(
    repo: &R,
    task_uuid: TaskId,
) -> Result<(), ServiceError> {
    let pending = repo.count_unfinished_dependencies(task_uuid)?;
    if pending > 0 {
        return Err(ServiceError::DependenciesNotDone { task_uuid, pending });
    }
    Ok(())
}

/// Demotes every transitive dependent of `task_uuid` that is `done` but no
/// longer eligible, recomputing each affected project.
///
/// Call after `task_uuid` moved away from `done`. Returns demoted ids in
/// demotion order.
pub fn revalidate_dependents<T, P>(
    tasks: &T,
    projects: &P,
    task_uuid: TaskId,
) -> Result<Vec<TaskId>, ServiceError>
where
    T: TaskRepository + ?Sized,
    P: ProjectRepository + ?Sized,
{
    let mut demoted = Vec::new();
    let mut worklist = VecDeque::from([task_uuid]);

    while let Some(current) = worklist.pop_front() {
        for dependent in tasks.dependents(current, Some(Status::Done))? {
            if can_be_marked_done(tasks, dependent.uuid)? {
                continue;
            }

            tasks.set_task_status(dependent.uuid, Status::InProgress)?;
            recalc_project(projects, tasks, dependent.project_uuid)?;
            demoted.push(dependent.uuid);
            worklist.push_back(dependent.uuid);
        }
    }

    if !demoted.is_empty() {
        info!(
            "event=dependent_cascade module=service status=ok task_id={} demoted={}",
            task_uuid,
            demoted.len()
        );
    }
    Ok(demoted)
}
