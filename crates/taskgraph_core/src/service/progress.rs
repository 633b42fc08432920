//! Project progress aggregation.

use crate::model::progress::ProjectProgress;
use crate::model::project::{Project, ProjectId};
use crate::repo::project_repo::ProjectRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use log::debug;

/// Recomputes and stores `status`/`completion_progress` for one project.
///
/// Returns `None` without writing when the project does not exist (for
/// example it was deleted earlier in the same unit of work). Idempotent.
pub fn recalc_project<P, T>(
    projects: &P,
    tasks: &T,
    project_uuid: ProjectId,
) -> RepoResult<Option<Project>>
where
    P: ProjectRepository + ?Sized,
    T: TaskRepository + ?Sized,
{
    if !projects.project_exists(project_uuid)? {
        return Ok(None);
    }

    let stats = tasks.project_task_stats(project_uuid)?;
    let progress = ProjectProgress::derive(&stats);
    projects.store_progress(project_uuid, &progress)?;

    debug!(
        "event=project_recalc module=service status=ok project_id={} tasks={} done={} progress_status={} progress={:.2}",
        project_uuid, stats.total, stats.done, progress.status, progress.completion_progress
    );
    projects.get_project(project_uuid)
}
