//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist project identity/name and the derived progress fields.
//!
//! # Invariants
//! - `store_progress` is the only write path for `status` and
//!   `completion_progress`.
//! - Listing is deterministic and newest first: `created_at DESC, rowid DESC`.

use crate::model::progress::ProjectProgress;
use crate::model::project::{Project, ProjectId};
use crate::model::status::Status;
use crate::model::validation::normalize_name;
use crate::repo::{
    parse_status, parse_uuid, push_name_search, push_pagination, RepoError, RepoResult,
    NEWEST_FIRST_ORDER,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const PROJECT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    status,
    completion_progress,
    created_at,
    updated_at
FROM projects";

/// Query options for listing projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectListQuery {
    /// Case-insensitive substring match on name.
    pub search: Option<String>,
    pub status: Option<Status>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for project persistence.
pub trait ProjectRepository {
    /// Inserts a project in `draft`/0 and returns the stored row.
    fn create_project(&self, name: &str) -> RepoResult<Project>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    fn project_exists(&self, id: ProjectId) -> RepoResult<bool>;
    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>>;
    fn rename_project(&self, id: ProjectId, name: &str) -> RepoResult<()>;
    /// Writes derived status/progress.
    fn store_progress(&self, id: ProjectId, progress: &ProjectProgress) -> RepoResult<()>;
    /// Deletes one project; its tasks and their edges go with it.
    ///
    /// Returns `false` when the project does not exist.
    fn delete_project(&self, id: ProjectId) -> RepoResult<bool>;
}

/// SQLite-backed project repository.
///
/// Works on plain connections and on open transactions alike.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        super::ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    /// Skips schema checks; callers must have verified the connection.
    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, name: &str) -> RepoResult<Project> {
        let name = normalize_name(name)?;
        let id = Uuid::new_v4();
        let progress = ProjectProgress::EMPTY;

        self.conn.execute(
            "INSERT INTO projects (uuid, name, status, completion_progress)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                name.as_str(),
                progress.status.as_str(),
                progress.completion_progress,
            ],
        )?;

        self.get_project(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("project {id} missing after insert")))
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn project_exists(&self, id: ProjectId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        let mut sql = format!("{PROJECT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        push_name_search(&mut sql, &mut bind_values, query.search.as_deref());

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(NEWEST_FIRST_ORDER);
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn rename_project(&self, id: ProjectId, name: &str) -> RepoResult<()> {
        let name = normalize_name(name)?;
        let changed = self.conn.execute(
            "UPDATE projects
             SET name = ?2,
                 updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE uuid = ?1;",
            params![id.to_string(), name.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id));
        }
        Ok(())
    }

    fn store_progress(&self, id: ProjectId, progress: &ProjectProgress) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET status = ?2,
                 completion_progress = ?3,
                 updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                progress.status.as_str(),
                progress.completion_progress,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id));
        }
        Ok(())
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let uuid_text: String = row.get("uuid")?;
    let status_text: String = row.get("status")?;
    let completion_progress: f64 = row.get("completion_progress")?;
    if !(0.0..=100.0).contains(&completion_progress) {
        return Err(RepoError::InvalidData(format!(
            "completion_progress {completion_progress} out of range in projects.completion_progress"
        )));
    }

    Ok(Project {
        uuid: parse_uuid(&uuid_text, "projects.uuid")?,
        name: row.get("name")?,
        status: parse_status(&status_text, "projects.status")?,
        completion_progress,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
