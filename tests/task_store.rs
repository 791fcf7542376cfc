//! Task store scenarios against a mocked service.

use std::time::Duration as StdDuration;

use chrono::{Duration, Local, TimeZone, Utc};
use mindsync::api::TaskApi;
use mindsync::editor::{TaskForm, TaskSave};
use mindsync::grouping::{bucket_for, group_tasks, Bucket};
use mindsync::models::{iso, Priority, Status, TaskDraft, TaskUpdate};
use mindsync::session::Session;
use mindsync::store::{Command, TaskStore};
use mindsync::Error;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> TaskStore {
    TaskStore::new(TaskApi::with_client(
        reqwest::Client::new(),
        &server.uri(),
        Some(Session::new("u-1")),
    ))
}

async fn mount_list(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_buy_milk_lifecycle() {
    let server = MockServer::start().await;
    let store = store_for(&server);

    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "t1", "title": "Buy milk", "priority": "low", "status": "pending"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t1", "title": "Buy milk", "priority": "low", "status": "completed"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "deleted"})))
        .mount(&server)
        .await;

    let now = Local::now();

    let tasks = store.add(TaskDraft::new("Buy milk")).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(bucket_for(&tasks[0], &now), Bucket::Upcoming);

    let tasks = store.toggle_status("t1").await.unwrap();
    assert_eq!(tasks[0].status, Status::Completed);
    assert_eq!(bucket_for(&tasks[0], &now), Bucket::Completed);

    let tasks = store.dispatch(Command::Delete("t1".to_string())).await.unwrap();
    assert!(tasks.is_empty());
    assert!(group_tasks(&store.tasks(), &now).is_empty());
}

#[tokio::test]
async fn test_task_due_yesterday_is_overdue() {
    let server = MockServer::start().await;
    let yesterday = (Local::now() - Duration::days(1)).date_naive();
    let due = Local
        .from_local_datetime(&yesterday.and_hms_opt(10, 0, 0).unwrap())
        .earliest()
        .unwrap()
        .with_timezone(&Utc);
    mount_list(
        &server,
        json!([{"id": "t1", "title": "Call bank", "status": "pending", "dueDate": iso::format(&due)}]),
    )
    .await;

    let store = store_for(&server);
    let tasks = store.load().await.unwrap();

    let grouped = group_tasks(&tasks, &Local::now());
    assert_eq!(grouped.overdue.len(), 1);
    assert_eq!(grouped.overdue[0].id, "t1");
}

#[tokio::test]
async fn test_add_puts_new_task_first() {
    let server = MockServer::start().await;
    mount_list(&server, json!([{"id": "old", "title": "Old"}])).await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "new", "title": "New"})))
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.load().await.unwrap();
    let tasks = store.add(TaskDraft::new("New")).await.unwrap();

    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[tokio::test]
async fn test_failed_mutations_leave_list_untouched() {
    let server = MockServer::start().await;
    mount_list(&server, json!([{"id": "t1", "title": "Keep me", "status": "pending"}])).await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/t1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/t1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let before = store.load().await.unwrap();

    let add = store.add(TaskDraft::new("Nope")).await;
    assert!(matches!(add, Err(Error::Server { status: 500, .. })));
    let update = store.toggle_status("t1").await;
    assert!(matches!(update, Err(Error::Server { status: 500, .. })));
    let delete = store.delete("t1").await;
    assert!(matches!(delete, Err(Error::Server { status: 503, .. })));

    assert_eq!(store.tasks(), before);
}

#[tokio::test]
async fn test_failed_load_keeps_previous_list() {
    let server = MockServer::start().await;
    let store = store_for(&server);

    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "t1", "title": "One"}])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    store.load().await.unwrap();
    assert!(store.load().await.is_err());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_load_skips_records_without_id_or_title() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            {"id": "ok", "title": "Fine"},
            {"title": "No id"},
            {"id": "blank", "title": ""}
        ]),
    )
    .await;

    let store = store_for(&server);
    let tasks = store.load().await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, "ok");
}

#[tokio::test]
async fn test_load_skips_records_of_the_wrong_shape() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            {"id": "ok", "title": "Fine"},
            {"id": "x", "title": "Odd", "attachments": [{"type": "image", "value": "a.png"}]},
            {"id": 7, "title": "Numeric id"},
            {"id": "y", "title": "String tags", "tags": "home"}
        ]),
    )
    .await;

    let store = store_for(&server);
    let tasks = store.load().await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, "ok");
}

#[tokio::test]
async fn test_load_without_session_fails_and_sends_nothing() {
    let server = MockServer::start().await;
    let store = TaskStore::new(TaskApi::with_client(
        reqwest::Client::new(),
        &server.uri(),
        None,
    ));

    assert!(matches!(store.load().await, Err(Error::NoUserIdentifier)));
    assert!(store.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_mutation_on_same_task_is_rejected_while_first_runs() {
    let server = MockServer::start().await;
    mount_list(&server, json!([{"id": "t1", "title": "Slow", "status": "pending"}])).await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/t1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "t1", "title": "Slow", "status": "completed"}))
                .set_delay(StdDuration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.load().await.unwrap();

    let (first, second) = tokio::join!(
        store.update(TaskUpdate::status("t1", Status::Completed)),
        store.update(TaskUpdate::status("t1", Status::Pending)),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(Error::InFlight(ref id)) if id == "t1"));
    assert_eq!(store.get("t1").unwrap().status, Status::Completed);

    // Released once the first request finished.
    assert!(store.update(TaskUpdate::status("t1", Status::Completed)).await.is_ok());
}

#[tokio::test]
async fn test_toggle_unknown_task_is_rejected_locally() {
    let server = MockServer::start().await;
    let store = store_for(&server);

    let result = store.toggle_status("missing").await;

    assert!(matches!(result, Err(Error::UnknownTask(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_priority_survives_form_server_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "t1", "title": "Ship it", "priority": "high"
        })))
        .mount(&server)
        .await;

    let mut form = TaskForm::new();
    form.title = "Ship it".to_string();
    form.priority = "High".parse::<Priority>().unwrap();
    let TaskSave::Create(draft) = form.save().unwrap() else {
        panic!("expected a draft");
    };

    let store = store_for(&server);
    let tasks = store.dispatch(Command::Add(draft)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["priority"], "high");
    assert_eq!(tasks[0].priority.to_string(), "High");
}
