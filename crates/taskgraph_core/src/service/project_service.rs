//! Project use-case service.
//!
//! # Responsibility
//! - Provide project create/update/delete/list entry points.
//!
//! # Invariants
//! - Callers can name projects but never write their status/progress; every
//!   write path ends with the progress aggregator.

use crate::model::project::{Project, ProjectId};
use crate::model::status::Status;
use crate::repo::ensure_schema_ready;
use crate::repo::project_repo::{ProjectListQuery, ProjectRepository, SqliteProjectRepository};
use crate::repo::task_repo::SqliteTaskRepository;
use crate::service::error::ServiceError;
use crate::service::progress::recalc_project;
use crate::service::unit_of_work::run_in_transaction;
use log::{debug, info};
use rusqlite::Connection;

/// Project service over a migrated SQLite connection.
pub struct ProjectService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ProjectService<'conn> {
    /// Creates service from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> Result<Self, ServiceError> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    /// Creates one project in `draft` with zero progress.
    pub fn create_project(&self, name: &str) -> Result<Project, ServiceError> {
        run_in_transaction(self.conn, "project_create", |tx| {
            let projects = SqliteProjectRepository::new_unchecked(tx);
            let project = projects.create_project(name)?;
            info!(
                "event=project_created module=service status=ok project_id={}",
                project.uuid
            );
            Ok(project)
        })
    }

    /// Renames one project and re-derives its status/progress.
    ///
    /// `requested_status` is accepted for caller compatibility only; the
    /// stored status always comes from the project's tasks.
    pub fn update_project(
        &self,
        id: ProjectId,
        name: &str,
        requested_status: Option<Status>,
    ) -> Result<Project, ServiceError> {
        run_in_transaction(self.conn, "project_update", |tx| {
            let projects = SqliteProjectRepository::new_unchecked(tx);
            let tasks = SqliteTaskRepository::new_unchecked(tx);

            projects.rename_project(id, name)?;
            let project =
                recalc_project(&projects, &tasks, id)?.ok_or(ServiceError::ProjectNotFound(id))?;

            if let Some(requested) = requested_status.filter(|status| *status != project.status) {
                debug!(
                    "event=project_status_ignored module=service status=ok project_id={} requested={} derived={}",
                    id, requested, project.status
                );
            }
            Ok(project)
        })
    }

    /// Deletes one project together with its tasks and their edges.
    ///
    /// Returns `false` when the project does not exist.
    pub fn delete_project(&self, id: ProjectId) -> Result<bool, ServiceError> {
        run_in_transaction(self.conn, "project_delete", |tx| {
            let projects = SqliteProjectRepository::new_unchecked(tx);
            let deleted = projects.delete_project(id)?;
            if deleted {
                info!(
                    "event=project_deleted module=service status=ok project_id={}",
                    id
                );
            }
            Ok(deleted)
        })
    }

    /// Re-derives and stores status/progress for one project.
    pub fn recalculate_project(&self, id: ProjectId) -> Result<Project, ServiceError> {
        run_in_transaction(self.conn, "project_recalculate", |tx| {
            let projects = SqliteProjectRepository::new_unchecked(tx);
            let tasks = SqliteTaskRepository::new_unchecked(tx);
            recalc_project(&projects, &tasks, id)?.ok_or(ServiceError::ProjectNotFound(id))
        })
    }

    /// Gets one project by id.
    pub fn get_project(&self, id: ProjectId) -> Result<Option<Project>, ServiceError> {
        let projects = SqliteProjectRepository::new_unchecked(self.conn);
        Ok(projects.get_project(id)?)
    }

    /// Lists projects using filter and pagination options.
    pub fn list_projects(&self, query: &ProjectListQuery) -> Result<Vec<Project>, ServiceError> {
        let projects = SqliteProjectRepository::new_unchecked(self.conn);
        Ok(projects.list_projects(query)?)
    }
}
