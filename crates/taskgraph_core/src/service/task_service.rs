//! Task use-case service.
//!
//! # Responsibility
//! - Provide task create/update/delete and dependency sync entry points.
//! - Run dependency sync, done-eligibility, the dependent cascade and
//!   project recalculation for each mutation inside one transaction.
//!
//! # Invariants
//! - A failed step rolls back the whole operation, including the task write.
//! - Every project whose task set changed is recomputed before commit.

use crate::model::project::ProjectId;
use crate::model::status::Status;
use crate::model::task::{Task, TaskId, TaskRecord, TaskRef};
use crate::model::validation::{normalize_name, validate_weight};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
use crate::repo::{ensure_schema_ready, RepoError};
use crate::service::dependency_graph::sync_dependencies;
use crate::service::eligibility::{ensure_can_be_marked_done, revalidate_dependents};
use crate::service::error::ServiceError;
use crate::service::progress::recalc_project;
use crate::service::unit_of_work::run_in_transaction;
use log::info;
use rusqlite::Connection;

/// Input for `TaskService::create_task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub name: String,
    pub status: Status,
    pub weight: i64,
    pub project_uuid: ProjectId,
    /// `None` creates the task without dependencies.
    pub dependency_ids: Option<Vec<TaskId>>,
}

/// Input for `TaskService::update_task`.
///
/// Name, status and weight are replaced; project and dependencies are kept
/// when `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    pub name: String,
    pub status: Status,
    pub weight: i64,
    /// Moves the task to another project when set.
    pub project_uuid: Option<ProjectId>,
    /// Replaces the whole dependency set when set.
    pub dependency_ids: Option<Vec<TaskId>>,
}

/// Task service over a migrated SQLite connection.
pub struct TaskService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> TaskService<'conn> {
    /// Creates service from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> Result<Self, ServiceError> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    /// Creates one task, optionally with dependencies.
    ///
    /// # Errors
    /// - `ProjectNotFound` when `project_uuid` does not exist.
    /// - `Validation` for blank name or weight < 1.
    /// - Any dependency-graph error for `dependency_ids`.
    /// - `DependenciesNotDone` when created as `done` with unfinished
    ///   dependencies.
    pub fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, ServiceError> {
        run_in_transaction(self.conn, "task_create", |tx| {
            let tasks = SqliteTaskRepository::new_unchecked(tx);
            let projects = SqliteProjectRepository::new_unchecked(tx);

            if !projects.project_exists(request.project_uuid)? {
                return Err(ServiceError::ProjectNotFound(request.project_uuid));
            }

            let record = TaskRecord::new(
                request.project_uuid,
                request.name.as_str(),
                request.status,
                request.weight,
            )?;
            tasks.create_task(&record)?;

            if let Some(dependency_ids) = request.dependency_ids.as_deref() {
                sync_dependencies(&tasks, &record.task_ref(), dependency_ids)?;
            }
            if record.status.is_done() {
                ensure_can_be_marked_done(&tasks, record.uuid)?;
            }

            recalc_project(&projects, &tasks, record.project_uuid)?;
            info!(
                "event=task_created module=service status=ok task_id={} project_id={}",
                record.uuid, record.project_uuid
            );
            load_task(&tasks, record.uuid)
        })
    }

    /// Updates one task.
    ///
    /// When the status moves away from `done`, dependents that are no longer
    /// eligible are demoted to `in_progress`. When the task moves to another
    /// project both projects are recomputed.
    ///
    /// # Errors
    /// - `TaskNotFound` / `ProjectNotFound` for unknown ids.
    /// - `Validation` for blank name or weight < 1.
    /// - Any dependency-graph error. On a project move the effective
    ///   dependency set (new or existing) and existing dependents must live in
    ///   the target project.
    /// - `DependenciesNotDone` when the resulting status is `done` with
    ///   unfinished dependencies.
    pub fn update_task(
        &self,
        id: TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<Task, ServiceError> {
        run_in_transaction(self.conn, "task_update", |tx| {
            let tasks = SqliteTaskRepository::new_unchecked(tx);
            let projects = SqliteProjectRepository::new_unchecked(tx);

            let current = tasks.get_task(id)?.ok_or(ServiceError::TaskNotFound(id))?;
            let target_project = request.project_uuid.unwrap_or(current.project_uuid);
            let moved = target_project != current.project_uuid;

            let record = TaskRecord {
                uuid: id,
                project_uuid: target_project,
                name: normalize_name(request.name.as_str())?,
                status: request.status,
                weight: validate_weight(request.weight)?,
            };

            if moved {
                if !projects.project_exists(target_project)? {
                    return Err(ServiceError::ProjectNotFound(target_project));
                }
                ensure_dependents_in_project(&tasks, &record.task_ref())?;
            }

            tasks.update_task(&record)?;

            let dependency_ids = match request.dependency_ids.as_deref() {
                Some(ids) => Some(ids),
                None if moved => Some(current.dependency_ids.as_slice()),
                None => None,
            };
            if let Some(dependency_ids) = dependency_ids {
                sync_dependencies(&tasks, &record.task_ref(), dependency_ids)?;
            }

            if record.status.is_done() {
                ensure_can_be_marked_done(&tasks, id)?;
            } else if current.is_done() {
                revalidate_dependents(&tasks, &projects, id)?;
            }

            recalc_project(&projects, &tasks, current.project_uuid)?;
            if moved {
                recalc_project(&projects, &tasks, target_project)?;
            }

            info!(
                "event=task_updated module=service status=ok task_id={} project_id={} moved={}",
                id, target_project, moved
            );
            load_task(&tasks, id)
        })
    }

    /// Deletes one task and every edge referencing it, then recomputes its
    /// project.
    ///
    /// Returns `false` when the task does not exist.
    pub fn delete_task(&self, id: TaskId) -> Result<bool, ServiceError> {
        run_in_transaction(self.conn, "task_delete", |tx| {
            let tasks = SqliteTaskRepository::new_unchecked(tx);
            let projects = SqliteProjectRepository::new_unchecked(tx);

            let Some(current) = tasks.get_task(id)? else {
                return Ok(false);
            };
            let deleted = tasks.delete_task(id)?;
            recalc_project(&projects, &tasks, current.project_uuid)?;
            Ok(deleted)
        })
    }

    /// Replaces the dependency set of one task.
    ///
    /// # Errors
    /// - `TaskNotFound` for an unknown task.
    /// - Any dependency-graph error; nothing is persisted in that case.
    /// - `DependenciesNotDone` when the task is `done` and the new set
    ///   contains unfinished tasks.
    pub fn sync_task_dependencies(
        &self,
        id: TaskId,
        dependency_ids: &[TaskId],
    ) -> Result<(), ServiceError> {
        run_in_transaction(self.conn, "task_sync_dependencies", |tx| {
            let tasks = SqliteTaskRepository::new_unchecked(tx);

            let current = tasks.get_task(id)?.ok_or(ServiceError::TaskNotFound(id))?;
            sync_dependencies(&tasks, &current.task_ref(), dependency_ids)?;
            if current.is_done() {
                ensure_can_be_marked_done(&tasks, id)?;
            }
            Ok(())
        })
    }

    /// Gets one task with its dependency ids.
    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>, ServiceError> {
        let tasks = SqliteTaskRepository::new_unchecked(self.conn);
        Ok(tasks.get_task(id)?)
    }

    /// Lists tasks using filter and pagination options.
    pub fn list_tasks(&self, query: &TaskListQuery) -> Result<Vec<Task>, ServiceError> {
        let tasks = SqliteTaskRepository::new_unchecked(self.conn);
        Ok(tasks.list_tasks(query)?)
    }

    /// Lists tasks that depend directly on `id`.
    pub fn list_dependents(&self, id: TaskId) -> Result<Vec<Task>, ServiceError> {
        let tasks = SqliteTaskRepository::new_unchecked(self.conn);
        if tasks.get_task(id)?.is_none() {
            return Err(ServiceError::TaskNotFound(id));
        }

        tasks
            .dependents(id, None)?
            .into_iter()
            .map(|dependent| load_task(&tasks, dependent.uuid))
            .collect()
    }
}

fn load_task<R: TaskRepository + ?Sized>(tasks: &R, id: TaskId) -> Result<Task, ServiceError> {
    tasks
        .get_task(id)?
        .ok_or_else(|| {
            ServiceError::Storage(RepoError::InvalidData(format!(
                "task {id} missing in read-back"
            )))
        })
}

/// Rejects a move that would leave an existing dependent in another project.
fn ensure_dependents_in_project<R: TaskRepository + ?Sized>(
    tasks: &R,
    task: &TaskRef,
) -> Result<(), ServiceError> {
    if let Some(dependent) = tasks
        .dependents(task.uuid, None)?
        .into_iter()
        .find(|dependent| dependent.project_uuid != task.project_uuid)
    {
        return Err(ServiceError::CrossProjectDependency {
            task_uuid: dependent.uuid,
            dependency_uuid: task.uuid,
        });
    }
    Ok(())
}
