//! HTTP mock tests for the task endpoints.
//!
//! Uses wiremock to stand in for the MindSync service.

use chrono::{TimeZone, Utc};
use mindsync::api::TaskApi;
use mindsync::models::{Attachment, Priority, Status, Tags, TaskDraft, TaskUpdate};
use mindsync::session::Session;
use mindsync::Error;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer, session: Option<Session>) -> TaskApi {
    TaskApi::with_client(reqwest::Client::new(), &server.uri(), session)
}

async fn last_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    requests.last().unwrap().body_json::<Value>().unwrap()
}

#[tokio::test]
async fn test_fetch_tasks_scopes_by_user_and_sends_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("user_id", "u-1"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "title": "First", "priority": "high"},
            {"_id": "b", "title": "Second", "reminderAt": "2025-07-25T14:30:00.000Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server, Some(Session::new("u-1").with_token("secret")));
    let tasks = api.fetch_tasks().await.unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].priority.as_deref(), Some("high"));
    assert_eq!(tasks[1].object_id.as_deref(), Some("b"));
    assert!(tasks[1].reminder_at.is_some());
}

#[tokio::test]
async fn test_fetch_tasks_without_session_makes_no_request() {
    let server = MockServer::start().await;

    let result = api_for(&server, None).fetch_tasks().await;

    assert!(matches!(result, Err(Error::NoUserIdentifier)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_user_id_counts_as_missing() {
    let server = MockServer::start().await;

    let result = api_for(&server, Some(Session::new("  ")))
        .create_task(&TaskDraft::new("t"))
        .await;

    assert!(matches!(result, Err(Error::NoUserIdentifier)));
}

#[tokio::test]
async fn test_create_task_maps_fields_for_the_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "srv-1", "title": "Write report", "priority": "high", "status": "pending"
        })))
        .mount(&server)
        .await;

    let mut draft = TaskDraft::new("Write report");
    draft.priority = Priority::High;
    draft.due_date = Some(Utc.with_ymd_and_hms(2025, 7, 25, 9, 0, 0).unwrap());
    draft.reminder = Some(Utc.with_ymd_and_hms(2025, 7, 25, 8, 0, 0).unwrap());
    draft.tags = Tags::from(vec!["work"]);
    draft.attachments = vec![Attachment::link("https://example.com/spec")];

    let created = api_for(&server, Some(Session::new("u-1")))
        .create_task(&draft)
        .await
        .unwrap();
    assert_eq!(created.id.as_deref(), Some("srv-1"));

    let body = last_body(&server).await;
    assert_eq!(body["userId"], "u-1");
    assert_eq!(body["priority"], "high");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["dueDate"], "2025-07-25T09:00:00.000Z");
    assert_eq!(body["reminderAt"], "2025-07-25T08:00:00.000Z");
    assert_eq!(body["tags"], json!(["work"]));
    assert_eq!(
        body["attachments"],
        json!([{"type": "link", "value": "https://example.com/spec"}])
    );
    assert!(body.get("reminder").is_none());
    assert!(body.get("description").is_none());
}

#[tokio::test]
async fn test_create_task_omits_absent_dates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "x", "title": "t"})))
        .mount(&server)
        .await;

    api_for(&server, Some(Session::new("u-1")))
        .create_task(&TaskDraft::new("t"))
        .await
        .unwrap();

    let body = last_body(&server).await;
    assert!(body.get("dueDate").is_none());
    assert!(body.get("reminderAt").is_none());
}

#[tokio::test]
async fn test_update_task_sends_only_changed_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/tasks/t-1"))
        .and(body_json(json!({"description": "x"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t-1", "title": "Keep", "description": "x"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let update = TaskUpdate {
        description: Some("x".to_string()),
        ..TaskUpdate::new("t-1")
    };
    let updated = api_for(&server, Some(Session::new("u-1")))
        .update_task("t-1", &update)
        .await
        .unwrap();

    assert_eq!(updated.description.as_deref(), Some("x"));
}

#[tokio::test]
async fn test_update_task_lowercases_priority_and_status() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/tasks/t-1"))
        .and(body_json(json!({"priority": "medium", "status": "in_progress"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "t-1", "title": "t"})))
        .expect(1)
        .mount(&server)
        .await;

    let update = TaskUpdate {
        priority: Some(Priority::Medium),
        status: Some(Status::InProgress),
        ..TaskUpdate::new("t-1")
    };
    api_for(&server, Some(Session::new("u-1")))
        .update_task("t-1", &update)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_error_is_returned_unchanged() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/tasks/t-1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Task not found"))
        .mount(&server)
        .await;

    let result = api_for(&server, Some(Session::new("u-1")))
        .update_task("t-1", &TaskUpdate::status("t-1", Status::Completed))
        .await;

    match result {
        Err(Error::Server { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Task not found");
        }
        other => panic!("expected a server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_task_returns_acknowledgement() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/tasks/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Task deleted"})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/t-2"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let api = api_for(&server, None);
    assert_eq!(
        api.delete_task("t-1").await.unwrap(),
        json!({"message": "Task deleted"})
    );
    assert_eq!(api.delete_task("t-2").await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_malformed_json_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("this is not json"))
        .mount(&server)
        .await;

    let result = api_for(&server, Some(Session::new("u-1"))).fetch_tasks().await;
    assert!(matches!(result, Err(Error::Transport(_))));
}
