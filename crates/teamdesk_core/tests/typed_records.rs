use serde_json::{json, Map, Value};
use std::time::Duration;
use teamdesk_core::db::open_db_in_memory;
use teamdesk_core::model::record::Collection;
use teamdesk_core::model::task::{Task, TaskPriority, TaskStatus};
use teamdesk_core::model::user::{User, UserRole};
use teamdesk_core::store::{
    create_record, fetch_record, fetch_records, patch_record, remove_record, subscribe,
    update_record, DocumentFilter, DocumentStore, SqliteDocumentStore, StoreError,
};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn create_then_fetch_returns_store_stamped_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::with_clock(&conn, || 42_000);

    let mut task = Task::with_id("T1", "Plan timeline", "P1", "E1");
    task.assignee_id = Some("E2".to_string());
    task.due_date = Some(99_000);
    create_record(&store, &task).unwrap();

    let stored: Task = fetch_record(&store, "T1").unwrap().unwrap();
    assert_eq!(stored.title, "Plan timeline");
    assert_eq!(stored.assignee_id.as_deref(), Some("E2"));
    assert_eq!(stored.due_date, Some(99_000));
    assert_eq!(stored.created_at, 42_000);
    assert_eq!(stored.updated_at, 42_000);
}

#[test]
fn invalid_records_are_rejected_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);

    let user = User::with_id("U1", "not-an-email", UserRole::Employee);
    let err = create_record(&store, &user).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.revision(Collection::Users).unwrap(), 0);
}

#[test]
fn update_requires_existing_record_and_clears_optionals() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);

    let mut task = Task::with_id("T1", "Plan", "P1", "E1");
    let err = update_record(&store, &task).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    task.assignee_id = Some("E2".to_string());
    create_record(&store, &task).unwrap();

    let mut stored: Task = fetch_record(&store, "T1").unwrap().unwrap();
    stored.assignee_id = None;
    stored.status = TaskStatus::Review;
    update_record(&store, &stored).unwrap();

    let reloaded: Task = fetch_record(&store, "T1").unwrap().unwrap();
    assert_eq!(reloaded.assignee_id, None);
    assert_eq!(reloaded.status, TaskStatus::Review);
}

#[test]
fn patch_validates_merged_result() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    create_record(&store, &Task::with_id("T1", "Plan", "P1", "E1")).unwrap();

    let patched: Task =
        patch_record(&store, "T1", &object(json!({ "priority": "high" }))).unwrap();
    assert_eq!(patched.priority, TaskPriority::High);

    let err = patch_record::<Task, _>(&store, "T1", &object(json!({ "priority": "urgent" })))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidDocument { .. }));

    let err = patch_record::<Task, _>(&store, "T1", &object(json!({ "title": "  " })))
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let unchanged: Task = fetch_record(&store, "T1").unwrap().unwrap();
    assert_eq!(unchanged.priority, TaskPriority::High);
    assert_eq!(unchanged.title, "Plan");
}

#[test]
fn reading_a_corrupt_document_is_an_error_not_a_skip() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    create_record(&store, &Task::with_id("T1", "Plan", "P1", "E1")).unwrap();
    store
        .write(
            Collection::Tasks,
            Some("T2"),
            &object(json!({ "title": "Broken", "status": "blocked" })),
        )
        .unwrap();

    let err = fetch_records::<Task, _>(&store, &DocumentFilter::all()).unwrap_err();
    assert!(matches!(err, StoreError::InvalidDocument { id, .. } if id == "T2"));
}

#[test]
fn remove_record_reports_whether_anything_was_removed() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    create_record(&store, &Task::with_id("T1", "Plan", "P1", "E1")).unwrap();

    assert!(remove_record::<Task, _>(&store, "T1").unwrap());
    assert!(!remove_record::<Task, _>(&store, "T1").unwrap());
    assert!(fetch_record::<Task, _>(&store, "T1").unwrap().is_none());
}

#[test]
fn subscription_yields_snapshots_on_change_and_stops_when_cancelled() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    create_record(&store, &Task::with_id("T1", "Plan", "P1", "E1")).unwrap();

    let mut subscription = subscribe::<Task>(
        &store,
        DocumentFilter::all().where_eq("projectId", "P1"),
        Duration::from_millis(1),
    );

    let first = subscription.next().unwrap().unwrap();
    assert_eq!(first.len(), 1);
    assert!(subscription.poll().unwrap().is_none());

    create_record(&store, &Task::with_id("T2", "Build", "P1", "E1")).unwrap();
    let second = subscription.next().unwrap().unwrap();
    let ids: Vec<&str> = second.iter().map(|task| task.id.as_str()).collect();
    assert_eq!(ids, vec!["T1", "T2"]);

    subscription.restart();
    assert_eq!(subscription.poll().unwrap().unwrap().len(), 2);

    let handle = subscription.cancel_handle();
    handle.cancel();
    assert!(subscription.next().is_none());
    assert!(subscription.poll().unwrap().is_none());
    subscription.unsubscribe();
}
