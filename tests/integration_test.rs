//! End-to-end tests over the socket protocol
//!
//! A real service (SQLite store, no LLM client) behind a Unix socket,
//! driven through ServiceClient exactly like the CLI would.

use serde_json::{Value, json};
use tempfile::TempDir;

use storyforge::api::listener::{create_listener_at, read_request, send_response};
use storyforge::api::{ApiRequest, ApiResponse, Service, ServiceClient};
use storyforge::state::StateManager;

/// Start a service on a socket inside `temp`, return a connected client
fn start_service(temp: &TempDir) -> ServiceClient {
    let socket_path = temp.path().join("storyforge.sock");
    let db_path = temp.path().join("storyforge.db");

    let state = StateManager::spawn(&db_path).unwrap();
    let service = Service::new(state, None);

    let (listener, _) = create_listener_at(&socket_path).unwrap();
    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            match read_request(&mut stream).await {
                Ok(ApiRequest::Shutdown) => {
                    let _ = send_response(&mut stream, &ApiResponse::ShuttingDown).await;
                    break;
                }
                Ok(request) => {
                    let response = service.handle(request).await;
                    let _ = send_response(&mut stream, &response).await;
                }
                Err(_) => break,
            }
        }
    });

    ServiceClient::new(socket_path)
}

fn task_payload() -> Value {
    json!({
        "title": "Implement login",
        "description": "Session-based login",
        "priority": "high",
        "effort_hours": 4,
        "status": "pending",
        "assigned_to": "Juan"
    })
}

fn story_payload() -> Value {
    json!({
        "project": "Demo",
        "role": "As a user",
        "goal": "I want to register",
        "reason": "so that I can log in",
        "description": "Registration flow",
        "priority": "medium",
        "story_points": 5,
        "effort_hours": 10
    })
}

async fn create(client: &ServiceClient, request: ApiRequest) -> Value {
    match client.request(&request).await.unwrap() {
        ApiResponse::Created { data } => data,
        other => panic!("expected Created, got {:?}", other),
    }
}

#[tokio::test]
async fn test_task_lifecycle_over_socket() {
    let temp = TempDir::new().unwrap();
    let client = start_service(&temp);

    // Create: the stored task carries an id and a timestamp.
    let created = create(&client, ApiRequest::CreateTask { payload: task_payload() }).await;
    let id = created["id"].as_i64().unwrap();
    assert!(created["created_at"].is_string());

    // Read back: every submitted field survives the round trip.
    match client.request(&ApiRequest::GetTask { id }).await.unwrap() {
        ApiResponse::Ok { data } => {
            assert_eq!(data["title"], "Implement login");
            assert_eq!(data["priority"], "high");
            assert_eq!(data["effort_hours"], 4.0);
        }
        other => panic!("expected Ok, got {:?}", other),
    }

    // Partial update: one field changes, the rest stay put.
    match client
        .request(&ApiRequest::UpdateTask {
            id,
            payload: json!({"status": "in-progress"}),
        })
        .await
        .unwrap()
    {
        ApiResponse::Ok { data } => {
            assert_eq!(data["status"], "in-progress");
            assert_eq!(data["title"], "Implement login");
            assert_eq!(data["created_at"], created["created_at"]);
        }
        other => panic!("expected Ok, got {:?}", other),
    }

    // Delete, then the task is gone.
    assert_eq!(
        client.request(&ApiRequest::DeleteTask { id }).await.unwrap(),
        ApiResponse::Ok { data: Value::Null }
    );
    assert!(matches!(
        client.request(&ApiRequest::GetTask { id }).await.unwrap(),
        ApiResponse::NotFound { .. }
    ));
}

#[tokio::test]
async fn test_invalid_payload_reports_every_violation() {
    let temp = TempDir::new().unwrap();
    let client = start_service(&temp);

    let response = client
        .request(&ApiRequest::CreateTask {
            payload: json!({"title": "T", "priority": "urgent", "status": "pendiente"}),
        })
        .await
        .unwrap();

    match response {
        ApiResponse::Invalid { violations } => {
            let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
            assert!(fields.contains(&"priority"));
            assert!(fields.contains(&"status"));
            assert!(fields.contains(&"description"));
            assert!(fields.contains(&"effort_hours"));
        }
        other => panic!("expected Invalid, got {:?}", other),
    }

    // Nothing was persisted.
    match client.request(&ApiRequest::ListTasks).await.unwrap() {
        ApiResponse::Ok { data } => assert_eq!(data.as_array().unwrap().len(), 0),
        other => panic!("expected Ok, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_update_leaves_stored_entity_intact() {
    let temp = TempDir::new().unwrap();
    let client = start_service(&temp);

    let created = create(&client, ApiRequest::CreateTask { payload: task_payload() }).await;
    let id = created["id"].as_i64().unwrap();

    let response = client
        .request(&ApiRequest::UpdateTask {
            id,
            payload: json!({"effort_hours": -3}),
        })
        .await
        .unwrap();
    assert!(matches!(response, ApiResponse::Invalid { .. }));

    match client.request(&ApiRequest::GetTask { id }).await.unwrap() {
        ApiResponse::Ok { data } => assert_eq!(data["effort_hours"], 4.0),
        other => panic!("expected Ok, got {:?}", other),
    }
}

#[tokio::test]
async fn test_story_lifecycle_and_task_detach() {
    let temp = TempDir::new().unwrap();
    let client = start_service(&temp);

    let story = create(&client, ApiRequest::CreateStory { payload: story_payload() }).await;
    let story_id = story["id"].as_i64().unwrap();

    let mut payload = task_payload();
    payload["user_story_id"] = json!(story_id);
    let task = create(&client, ApiRequest::CreateTask { payload }).await;
    let task_id = task["id"].as_i64().unwrap();
    assert_eq!(task["user_story_id"], json!(story_id));

    // Story update by merge.
    match client
        .request(&ApiRequest::UpdateStory {
            id: story_id,
            payload: json!({"story_points": 8}),
        })
        .await
        .unwrap()
    {
        ApiResponse::Ok { data } => {
            assert_eq!(data["story_points"], 8);
            assert_eq!(data["project"], "Demo");
        }
        other => panic!("expected Ok, got {:?}", other),
    }

    // Deleting the story detaches the task instead of deleting it.
    client.request(&ApiRequest::DeleteStory { id: story_id }).await.unwrap();
    match client.request(&ApiRequest::GetTask { id: task_id }).await.unwrap() {
        ApiResponse::Ok { data } => {
            assert!(data.get("user_story_id").is_none());
            assert_eq!(data["title"], "Implement login");
        }
        other => panic!("expected Ok, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ai_operations_fail_cleanly_without_llm() {
    let temp = TempDir::new().unwrap();
    let client = start_service(&temp);

    let response = client
        .request(&ApiRequest::DescribeTask {
            payload: json!({"title": "T"}),
        })
        .await
        .unwrap();
    assert!(matches!(response, ApiResponse::GenerationFailed { .. }));

    let response = client
        .request(&ApiRequest::GenerateStory {
            prompt: "order tracking".to_string(),
        })
        .await
        .unwrap();
    assert!(matches!(response, ApiResponse::GenerationFailed { .. }));
}

#[tokio::test]
async fn test_ping_and_shutdown() {
    let temp = TempDir::new().unwrap();
    let client = start_service(&temp);

    let version = client.ping().await.unwrap();
    assert_eq!(version, env!("CARGO_PKG_VERSION"));

    client.shutdown().await.unwrap();
}
