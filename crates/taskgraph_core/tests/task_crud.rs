use rusqlite::Connection;
use taskgraph_core::db::open_db_in_memory;
use taskgraph_core::{
    CreateTaskRequest, ErrorKind, ProjectId, ProjectService, ServiceError, Status, Task,
    TaskListQuery, TaskService, UpdateTaskRequest, ValidationError, MAX_WEIGHT,
};
use uuid::Uuid;

fn new_project(conn: &Connection, name: &str) -> ProjectId {
    ProjectService::try_new(conn)
        .unwrap()
        .create_project(name)
        .unwrap()
        .uuid
}

fn request(project_uuid: ProjectId, name: &str, weight: i64) -> CreateTaskRequest {
    CreateTaskRequest {
        name: name.to_string(),
        status: Status::Draft,
        weight,
        project_uuid,
        dependency_ids: None,
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn, "P");
    let service = TaskService::try_new(&conn).unwrap();

    let created = service.create_task(&request(project, "  Draft copy ", 3)).unwrap();
    assert_eq!(created.name, "Draft copy");
    assert_eq!(created.weight, 3);
    assert_eq!(created.status, Status::Draft);
    assert!(created.dependency_ids.is_empty());

    let loaded: Task = service.get_task(created.uuid).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn non_positive_weight_and_blank_name_fail_validation() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn, "P");
    let service = TaskService::try_new(&conn).unwrap();

    for weight in [0, -3] {
        let err = service.create_task(&request(project, "A", weight)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::NonPositiveWeight(w)) if w == weight
        ));
    }

    let blank = service.create_task(&request(project, "   ", 1)).unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::ValidationFailed);
    assert_eq!(count(&conn, "tasks"), 0);
}

#[test]
fn unknown_ids_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    let create = service
        .create_task(&request(missing, "A", 1))
        .unwrap_err();
    assert!(matches!(create, ServiceError::ProjectNotFound(id) if id == missing));

    let update = service
        .update_task(
            missing,
            &UpdateTaskRequest {
                name: "A".to_string(),
                status: Status::Done,
                weight: 1,
                project_uuid: None,
                dependency_ids: None,
            },
        )
        .unwrap_err();
    assert!(matches!(update, ServiceError::TaskNotFound(id) if id == missing));

    let sync = service.sync_task_dependencies(missing, &[]).unwrap_err();
    assert_eq!(sync.kind(), ErrorKind::NotFound);
    assert_eq!(
        service.list_dependents(missing).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(service.get_task(missing).unwrap().is_none());
    assert!(!service.delete_task(missing).unwrap());
}

#[test]
fn update_replaces_fields_and_keeps_dependencies_when_omitted() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn, "P");
    let service = TaskService::try_new(&conn).unwrap();
    let a = service.create_task(&request(project, "A", 1)).unwrap();
    let mut b_request = request(project, "B", 1);
    b_request.dependency_ids = Some(vec![a.uuid]);
    let b = service.create_task(&b_request).unwrap();

    let updated = service
        .update_task(
            b.uuid,
            &UpdateTaskRequest {
                name: "B renamed".to_string(),
                status: Status::InProgress,
                weight: 5,
                project_uuid: None,
                dependency_ids: None,
            },
        )
        .unwrap();

    assert_eq!(updated.name, "B renamed");
    assert_eq!(updated.status, Status::InProgress);
    assert_eq!(updated.weight, 5);
    assert_eq!(updated.dependency_ids, vec![a.uuid]);
}

#[test]
fn failed_update_rolls_back_every_field() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn, "P");
    let service = TaskService::try_new(&conn).unwrap();
    let a = service.create_task(&request(project, "A", 1)).unwrap();

    let err = service
        .update_task(
            a.uuid,
            &UpdateTaskRequest {
                name: "renamed".to_string(),
                status: Status::InProgress,
                weight: 9,
                project_uuid: None,
                dependency_ids: Some(vec![a.uuid]),
            },
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SelfDependency);
    assert_eq!(service.get_task(a.uuid).unwrap().unwrap(), a);
}

#[test]
fn delete_removes_edges_in_both_directions() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn, "P");
    let service = TaskService::try_new(&conn).unwrap();
    let a = service.create_task(&request(project, "A", 1)).unwrap();
    let b = service.create_task(&request(project, "B", 1)).unwrap();
    let c = service.create_task(&request(project, "C", 1)).unwrap();
    service.sync_task_dependencies(b.uuid, &[a.uuid]).unwrap();
    service.sync_task_dependencies(c.uuid, &[b.uuid]).unwrap();
    assert_eq!(count(&conn, "task_dependencies"), 2);

    assert!(service.delete_task(b.uuid).unwrap());

    assert_eq!(count(&conn, "task_dependencies"), 0);
    assert!(service.get_task(c.uuid).unwrap().unwrap().dependency_ids.is_empty());
    assert!(service.list_dependents(a.uuid).unwrap().is_empty());
}

#[test]
fn list_dependents_returns_direct_dependents_only() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn, "P");
    let service = TaskService::try_new(&conn).unwrap();
    let a = service.create_task(&request(project, "A", 1)).unwrap();
    let b = service.create_task(&request(project, "B", 1)).unwrap();
    let c = service.create_task(&request(project, "C", 1)).unwrap();
    service.sync_task_dependencies(b.uuid, &[a.uuid]).unwrap();
    service.sync_task_dependencies(c.uuid, &[b.uuid]).unwrap();

    let dependents = service.list_dependents(a.uuid).unwrap();
    assert_eq!(
        dependents.iter().map(|task| task.uuid).collect::<Vec<_>>(),
        vec![b.uuid]
    );
}

#[test]
fn list_tasks_filters_by_project_status_and_search() {
    let conn = open_db_in_memory().unwrap();
    let first = new_project(&conn, "P1");
    let second = new_project(&conn, "P2");
    let service = TaskService::try_new(&conn).unwrap();
    let write = service.create_task(&request(first, "Write docs", 1)).unwrap();
    let mut review = request(first, "Review docs", 1);
    review.status = Status::InProgress;
    let review = service.create_task(&review).unwrap();
    service.create_task(&request(second, "Write tests", 1)).unwrap();

    let in_first = service
        .list_tasks(&TaskListQuery {
            project_uuid: Some(first),
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(in_first.len(), 2);

    let in_progress = service
        .list_tasks(&TaskListQuery {
            status: Some(Status::InProgress),
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(
        in_progress.iter().map(|task| task.uuid).collect::<Vec<_>>(),
        vec![review.uuid]
    );

    let searched = service
        .list_tasks(&TaskListQuery {
            project_uuid: Some(first),
            search: Some("write".to_string()),
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(
        searched.iter().map(|task| task.uuid).collect::<Vec<_>>(),
        vec![write.uuid]
    );
    assert_eq!(
        service
            .list_tasks(&TaskListQuery {
                offset: 2,
                ..TaskListQuery::default()
            })
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn oversized_weight_fails_validation_and_project_stays_writable() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn, "P");
    let service = TaskService::try_new(&conn).unwrap();

    let err = service
        .create_task(&request(project, "huge", i64::MAX))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::WeightTooLarge(i64::MAX))
    ));

    let big = service
        .create_task(&request(project, "big", MAX_WEIGHT))
        .unwrap();
    service
        .create_task(&request(project, "big too", MAX_WEIGHT))
        .unwrap();
    let small = service.create_task(&request(project, "small", 1)).unwrap();

    let update = service
        .update_task(
            small.uuid,
            &UpdateTaskRequest {
                name: small.name.clone(),
                status: Status::Done,
                weight: MAX_WEIGHT + 1,
                project_uuid: None,
                dependency_ids: None,
            },
        )
        .unwrap_err();
    assert_eq!(update.kind(), ErrorKind::ValidationFailed);

    assert!(service.delete_task(big.uuid).unwrap());
    let recalculated = ProjectService::try_new(&conn)
        .unwrap()
        .recalculate_project(project)
        .unwrap();
    assert_eq!(recalculated.status, Status::Draft);
    assert_eq!(recalculated.completion_progress, 0.0);
}

#[test]
fn search_matches_wildcard_characters_literally() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn, "P");
    let service = TaskService::try_new(&conn).unwrap();
    let percent = service.create_task(&request(project, "Reach 50% coverage", 1)).unwrap();
    service.create_task(&request(project, "Reach 500 users", 1)).unwrap();
    let underscore = service.create_task(&request(project, "rename a_b", 1)).unwrap();
    service.create_task(&request(project, "rename axb", 1)).unwrap();
    let backslash = service.create_task(&request(project, r"fix C:\tmp path", 1)).unwrap();

    let search = |text: &str| {
        service
            .list_tasks(&TaskListQuery {
                search: Some(text.to_string()),
                ..TaskListQuery::default()
            })
            .unwrap()
            .into_iter()
            .map(|task| task.uuid)
            .collect::<Vec<_>>()
    };

    assert_eq!(search("50%"), vec![percent.uuid]);
    assert_eq!(search("a_b"), vec![underscore.uuid]);
    assert_eq!(search(r"C:\tmp"), vec![backslash.uuid]);
    assert_eq!(search("reach").len(), 2);
}

#[test]
fn list_tasks_returns_newest_first_within_the_same_instant() {
    let conn = open_db_in_memory().unwrap();
    let project = new_project(&conn, "P");
    let service = TaskService::try_new(&conn).unwrap();

    let created: Vec<_> = (0..5)
        .map(|index| {
            service
                .create_task(&request(project, &format!("task {index}"), 1))
                .unwrap()
                .uuid
        })
        .collect();
    conn.execute("UPDATE tasks SET created_at = 1000;", [])
        .unwrap();

    let listed: Vec<_> = service
        .list_tasks(&TaskListQuery::default())
        .unwrap()
        .into_iter()
        .map(|task| task.uuid)
        .collect();
    let mut expected = created;
    expected.reverse();
    assert_eq!(listed, expected);
}
