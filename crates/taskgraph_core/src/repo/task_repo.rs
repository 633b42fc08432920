//! Task and dependency-edge repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist task rows and the `task_dependencies` edge set.
//! - Answer the graph queries the engine needs (edges, dependents,
//!   unfinished dependency counts, per-project aggregates).
//!
//! # Invariants
//! - Edge direction is `task_uuid -> dependency_uuid`.
//! - `replace_dependencies` only touches edges that actually change.
//! - Deleting a task removes every edge referencing it, in both directions.

use crate::model::progress::TaskStats;
use crate::model::project::ProjectId;
use crate::model::status::Status;
use crate::model::task::{Task, TaskId, TaskRecord, TaskRef};
use crate::repo::{
    parse_status, parse_uuid, push_name_search, push_pagination, RepoError, RepoResult,
    NEWEST_FIRST_ORDER,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::{BTreeMap, BTreeSet};

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    project_uuid,
    name,
    status,
    weight,
    created_at,
    updated_at
FROM tasks";

/// Query options for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub project_uuid: Option<ProjectId>,
    pub status: Option<Status>,
    /// Case-insensitive substring match on name.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Edge changes applied by `replace_dependencies`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyDiff {
    /// Sorted ascending.
    pub added: Vec<TaskId>,
    /// Sorted ascending.
    pub removed: Vec<TaskId>,
}

impl DependencyDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Repository interface for tasks and their dependency edges.
pub trait TaskRepository {
    fn create_task(&self, record: &TaskRecord) -> RepoResult<()>;
    /// Overwrites name/status/weight/project of an existing task.
    fn update_task(&self, record: &TaskRecord) -> RepoResult<()>;
    fn set_task_status(&self, id: TaskId, status: Status) -> RepoResult<()>;
    /// Loads one task with its dependency ids.
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    /// Deletes one task and all edges referencing it.
    ///
    /// Returns `false` when the task does not exist.
    fn delete_task(&self, id: TaskId) -> RepoResult<bool>;
    /// Resolves ids to their owning project. Unknown ids are absent from the
    /// returned map.
    fn task_projects(&self, ids: &BTreeSet<TaskId>) -> RepoResult<BTreeMap<TaskId, ProjectId>>;
    /// Direct dependencies currently stored for `id`.
    fn dependency_ids(&self, id: TaskId) -> RepoResult<BTreeSet<TaskId>>;
    /// Replaces the stored edge set of `id` with exactly `dependency_ids`.
    fn replace_dependencies(
        &self,
        id: TaskId,
        dependency_ids: &BTreeSet<TaskId>,
    ) -> RepoResult<DependencyDiff>;
    /// Number of direct dependencies of `id` whose status is not `done`.
    fn count_unfinished_dependencies(&self, id: TaskId) -> RepoResult<u64>;
    /// Tasks listing `id` as a dependency, optionally filtered by status.
    fn dependents(&self, id: TaskId, status: Option<Status>) -> RepoResult<Vec<TaskRef>>;
    /// Aggregate counts/weights over all tasks of one project.
    fn project_task_stats(&self, project_uuid: ProjectId) -> RepoResult<TaskStats>;
}

/// SQLite-backed task repository.
///
/// Works on plain connections and on open transactions alike.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
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

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, record: &TaskRecord) -> RepoResult<()> {
        record.validate()?;

        let project_exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE uuid = ?1);",
            [record.project_uuid.to_string()],
            |row| row.get(0),
        )?;
        if project_exists == 0 {
            return Err(RepoError::ProjectNotFound(record.project_uuid));
        }

        self.conn.execute(
            "INSERT INTO tasks (uuid, project_uuid, name, status, weight)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                record.uuid.to_string(),
                record.project_uuid.to_string(),
                record.name.as_str(),
                record.status.as_str(),
                record.weight,
            ],
        )?;
        Ok(())
    }

    fn update_task(&self, record: &TaskRecord) -> RepoResult<()> {
        record.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET project_uuid = ?2,
                 name = ?3,
                 status = ?4,
                 weight = ?5,
                 updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE uuid = ?1;",
            params![
                record.uuid.to_string(),
                record.project_uuid.to_string(),
                record.name.as_str(),
                record.status.as_str(),
                record.weight,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(record.uuid));
        }
        Ok(())
    }

    fn set_task_status(&self, id: TaskId, status: Status) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET status = ?2,
                 updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE uuid = ?1;",
            params![id.to_string(), status.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let task = parse_task_row(row)?;
            return Ok(Some(self.with_dependencies(task)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(project_uuid) = query.project_uuid {
            sql.push_str(" AND project_uuid = ?");
            bind_values.push(Value::Text(project_uuid.to_string()));
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        push_name_search(&mut sql, &mut bind_values, query.search.as_deref());

        sql.push_str(NEWEST_FIRST_ORDER);
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        tasks
            .into_iter()
            .map(|task| self.with_dependencies(task))
            .collect()
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<bool> {
        let id_text = id.to_string();
        // Both edge directions; must hold even with foreign_keys off.
        self.conn.execute(
            "DELETE FROM task_dependencies
             WHERE task_uuid = ?1
                OR dependency_uuid = ?1;",
            [id_text.as_str()],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id_text.as_str()])?;
        Ok(changed > 0)
    }

    fn task_projects(&self, ids: &BTreeSet<TaskId>) -> RepoResult<BTreeMap<TaskId, ProjectId>> {
        let mut resolved = BTreeMap::new();
        if ids.is_empty() {
            return Ok(resolved);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT uuid, project_uuid FROM tasks WHERE uuid IN ({placeholders});");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(ids.iter().map(|id| id.to_string())))?;
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            let project_text: String = row.get(1)?;
            resolved.insert(
                parse_uuid(&uuid_text, "tasks.uuid")?,
                parse_uuid(&project_text, "tasks.project_uuid")?,
            );
        }
        Ok(resolved)
    }

    fn dependency_ids(&self, id: TaskId) -> RepoResult<BTreeSet<TaskId>> {
        let mut stmt = self.conn.prepare(
            "SELECT dependency_uuid
             FROM task_dependencies
             WHERE task_uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut ids = BTreeSet::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.insert(parse_uuid(&value, "task_dependencies.dependency_uuid")?);
        }
        Ok(ids)
    }

    fn replace_dependencies(
        &self,
        id: TaskId,
        dependency_ids: &BTreeSet<TaskId>,
    ) -> RepoResult<DependencyDiff> {
        let current = self.dependency_ids(id)?;
        let diff = DependencyDiff {
            added: dependency_ids.difference(&current).copied().collect(),
            removed: current.difference(dependency_ids).copied().collect(),
        };

        let id_text = id.to_string();
        for removed in &diff.removed {
            self.conn.execute(
                "DELETE FROM task_dependencies
                 WHERE task_uuid = ?1
                   AND dependency_uuid = ?2;",
                params![id_text.as_str(), removed.to_string()],
            )?;
        }
        for added in &diff.added {
            self.conn.execute(
                "INSERT INTO task_dependencies (task_uuid, dependency_uuid)
                 VALUES (?1, ?2);",
                params![id_text.as_str(), added.to_string()],
            )?;
        }

        Ok(diff)
    }

    fn count_unfinished_dependencies(&self, id: TaskId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM task_dependencies d
             INNER JOIN tasks t ON t.uuid = d.dependency_uuid
             WHERE d.task_uuid = ?1
               AND t.status <> 'done';",
            [id.to_string()],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative dependency count {count}")))
    }

    fn dependents(&self, id: TaskId, status: Option<Status>) -> RepoResult<Vec<TaskRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.uuid, t.project_uuid
             FROM task_dependencies d
             INNER JOIN tasks t ON t.uuid = d.task_uuid
             WHERE d.dependency_uuid = ?1
               AND (?2 IS NULL OR t.status = ?2)
             ORDER BY t.uuid ASC;",
        )?;
        let mut rows = stmt.query(params![id.to_string(), status.map(Status::as_str)])?;
        let mut dependents = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            let project_text: String = row.get(1)?;
            dependents.push(TaskRef {
                uuid: parse_uuid(&uuid_text, "tasks.uuid")?,
                project_uuid: parse_uuid(&project_text, "tasks.project_uuid")?,
            });
        }
        Ok(dependents)
    }

    fn project_task_stats(&self, project_uuid: ProjectId) -> RepoResult<TaskStats> {
        let stats = self.conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'done' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'draft' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'done' THEN weight ELSE 0 END), 0),
                COALESCE(SUM(weight), 0)
             FROM tasks
             WHERE project_uuid = ?1;",
            [project_uuid.to_string()],
            |row| {
                Ok(TaskStats {
                    total: row.get(0)?,
                    done: row.get(1)?,
                    draft: row.get(2)?,
                    done_weight: row.get(3)?,
                    total_weight: row.get(4)?,
                })
            },
        )?;
        Ok(stats)
    }
}

impl SqliteTaskRepository<'_> {
    fn with_dependencies(&self, mut task: Task) -> RepoResult<Task> {
        task.dependency_ids = self.dependency_ids(task.uuid)?.into_iter().collect();
        Ok(task)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let project_text: String = row.get("project_uuid")?;
    let status_text: String = row.get("status")?;
    let weight: i64 = row.get("weight")?;
    if weight < 1 {
        return Err(RepoError::InvalidData(format!(
            "invalid weight `{weight}` in tasks.weight"
        )));
    }

    Ok(Task {
        uuid: parse_uuid(&uuid_text, "tasks.uuid")?,
        project_uuid: parse_uuid(&project_text, "tasks.project_uuid")?,
        name: row.get("name")?,
        status: parse_status(&status_text, "tasks.status")?,
        weight,
        dependency_ids: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
