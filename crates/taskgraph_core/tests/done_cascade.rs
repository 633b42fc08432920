use rusqlite::Connection;
use taskgraph_core::db::open_db_in_memory;
use taskgraph_core::{
    can_be_marked_done, revalidate_dependents, CreateTaskRequest, ErrorKind, ProjectId,
    ProjectService, ServiceError, SqliteProjectRepository, SqliteTaskRepository, Status, Task,
    TaskId, TaskRepository, TaskService, UpdateTaskRequest,
};

fn new_project(conn: &Connection) -> ProjectId {
    ProjectService::try_new(conn)
        .unwrap()
        .create_project("Launch")
        .unwrap()
        .uuid
}

fn new_task(
    service: &TaskService<'_>,
    project_uuid: ProjectId,
    name: &str,
    weight: i64,
    dependency_ids: &[TaskId],
) -> Task {
    service
        .create_task(&CreateTaskRequest {
            name: name.to_string(),
            status: Status::Draft,
            weight,
            project_uuid,
            dependency_ids: Some(dependency_ids.to_vec()),
        })
        .unwrap()
}

fn set_status(service: &TaskService<'_>, task: &Task, status: Status) -> Result<Task, ServiceError> {
    service.update_task(
        task.uuid,
        &UpdateTaskRequest {
            name: task.name.clone(),
            status,
            weight: task.weight,
            project_uuid: None,
            dependency_ids: None,
        },
    )
}

fn status_of(service: &TaskService<'_>, id: TaskId) -> Status {
    service.get_task(id).unwrap().unwrap().status
}

#[test]
fn dependent_can_be_done_once_dependency_is_done() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn);
    let tasks = TaskService::try_new(&conn).unwrap();
    let projects = ProjectService::try_new(&conn).unwrap();

    let a = new_task(&tasks, project, "A", 4, &[]);
    let b = new_task(&tasks, project, "B", 6, &[a.uuid]);
    let b = set_status(&tasks, &b, Status::InProgress).unwrap();

    set_status(&tasks, &a, Status::Done).unwrap();
    let after_a = projects.get_project(project).unwrap().unwrap();
    assert_eq!(after_a.status, Status::InProgress);
    assert_eq!(after_a.completion_progress, 40.0);

    let b_done = set_status(&tasks, &b, Status::Done).unwrap();
    assert_eq!(b_done.status, Status::Done);
    let after_b = projects.get_project(project).unwrap().unwrap();
    assert_eq!(after_b.status, Status::Done);
    assert_eq!(after_b.completion_progress, 100.0);
}

#[test]
fn marking_done_with_unfinished_dependency_fails_and_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn);
    let tasks = TaskService::try_new(&conn).unwrap();

    let a = new_task(&tasks, project, "A", 4, &[]);
    let b = new_task(&tasks, project, "B", 6, &[a.uuid]);

    let err = set_status(&tasks, &b, Status::Done).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DependenciesNotDone);
    assert!(matches!(
        err,
        ServiceError::DependenciesNotDone { task_uuid, pending: 1 } if task_uuid == b.uuid
    ));
    assert_eq!(status_of(&tasks, b.uuid), Status::Draft);

    let project_row = ProjectService::try_new(&conn)
        .unwrap()
        .get_project(project)
        .unwrap()
        .unwrap();
    assert_eq!(project_row.status, Status::Draft);
    assert_eq!(project_row.completion_progress, 0.0);
}

#[test]
fn reopening_dependency_demotes_done_dependent() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn);
    let tasks = TaskService::try_new(&conn).unwrap();
    let projects = ProjectService::try_new(&conn).unwrap();

    let a = new_task(&tasks, project, "A", 4, &[]);
    let b = new_task(&tasks, project, "B", 6, &[a.uuid]);
    set_status(&tasks, &a, Status::Done).unwrap();
    set_status(&tasks, &b, Status::Done).unwrap();

    set_status(&tasks, &a, Status::InProgress).unwrap();

    assert_eq!(status_of(&tasks, a.uuid), Status::InProgress);
    assert_eq!(status_of(&tasks, b.uuid), Status::InProgress);
    let project_row = projects.get_project(project).unwrap().unwrap();
    assert_eq!(project_row.status, Status::InProgress);
    assert_eq!(project_row.completion_progress, 0.0);
}

#[test]
fn demotion_cascades_through_a_chain() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn);
    let tasks = TaskService::try_new(&conn).unwrap();

    let a = new_task(&tasks, project, "A", 1, &[]);
    let b = new_task(&tasks, project, "B", 1, &[a.uuid]);
    let c = new_task(&tasks, project, "C", 1, &[b.uuid]);
    let side = new_task(&tasks, project, "side", 1, &[]);
    for task in [&a, &b, &c, &side] {
        set_status(&tasks, task, Status::Done).unwrap();
    }

    set_status(&tasks, &a, Status::Draft).unwrap();

    assert_eq!(status_of(&tasks, a.uuid), Status::Draft);
    assert_eq!(status_of(&tasks, b.uuid), Status::InProgress);
    assert_eq!(status_of(&tasks, c.uuid), Status::InProgress);
    assert_eq!(status_of(&tasks, side.uuid), Status::Done);

    let project_row = ProjectService::try_new(&conn)
        .unwrap()
        .get_project(project)
        .unwrap()
        .unwrap();
    assert_eq!(project_row.completion_progress, 25.0);
}

#[test]
fn cascade_returns_demoted_ids_in_order() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn);
    let tasks = TaskService::try_new(&conn).unwrap();

    let a = new_task(&tasks, project, "A", 1, &[]);
    let b = new_task(&tasks, project, "B", 1, &[a.uuid]);
    let c = new_task(&tasks, project, "C", 1, &[b.uuid]);
    for task in [&a, &b, &c] {
        set_status(&tasks, task, Status::Done).unwrap();
    }

    let task_repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let project_repo = SqliteProjectRepository::try_new(&conn).unwrap();
    task_repo.set_task_status(a.uuid, Status::InProgress).unwrap();

    let demoted = revalidate_dependents(&task_repo, &project_repo, a.uuid).unwrap();
    assert_eq!(demoted, vec![b.uuid, c.uuid]);

    let again = revalidate_dependents(&task_repo, &project_repo, a.uuid).unwrap();
    assert!(again.is_empty());
}

#[test]
fn task_without_dependencies_can_always_be_done() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn);
    let tasks = TaskService::try_new(&conn).unwrap();

    let created = tasks
        .create_task(&CreateTaskRequest {
            name: "solo".to_string(),
            status: Status::Done,
            weight: 2,
            project_uuid: project,
            dependency_ids: None,
        })
        .unwrap();
    assert_eq!(created.status, Status::Done);

    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    assert!(can_be_marked_done(&repo, created.uuid).unwrap());
}

#[test]
fn create_as_done_with_unfinished_dependency_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn);
    let tasks = TaskService::try_new(&conn).unwrap();
    let a = new_task(&tasks, project, "A", 1, &[]);

    let err = tasks
        .create_task(&CreateTaskRequest {
            name: "B".to_string(),
            status: Status::Done,
            weight: 1,
            project_uuid: project,
            dependency_ids: Some(vec![a.uuid]),
        })
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependenciesNotDone);
    assert_eq!(
        tasks
            .list_tasks(&Default::default())
            .unwrap()
            .into_iter()
            .map(|task| task.uuid)
            .collect::<Vec<_>>(),
        vec![a.uuid]
    );
}

#[test]
fn adding_unfinished_dependency_to_done_task_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn);
    let tasks = TaskService::try_new(&conn).unwrap();

    let a = new_task(&tasks, project, "A", 1, &[]);
    let b = new_task(&tasks, project, "B", 1, &[]);
    set_status(&tasks, &b, Status::Done).unwrap();

    let err = tasks.sync_task_dependencies(b.uuid, &[a.uuid]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DependenciesNotDone);
    assert!(tasks
        .get_task(b.uuid)
        .unwrap()
        .unwrap()
        .dependency_ids
        .is_empty());

    set_status(&tasks, &a, Status::Done).unwrap();
    tasks.sync_task_dependencies(b.uuid, &[a.uuid]).unwrap();
    assert_eq!(
        tasks.get_task(b.uuid).unwrap().unwrap().dependency_ids,
        vec![a.uuid]
    );
}
