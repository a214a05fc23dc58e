//! API message types
//!
//! Simple JSON-over-newline protocol. Each request is a single line of JSON
//! followed by `\n`, answered with a single response line. Entity payloads
//! travel as raw JSON objects; the entity validator decides what they mean.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::FieldViolation;

/// Requests from clients to the service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ApiRequest {
    // Task CRUD
    CreateTask { payload: Value },
    GetTask { id: i64 },
    ListTasks,
    UpdateTask { id: i64, payload: Value },
    DeleteTask { id: i64 },

    // Task enrichment: payload in, enriched payload out, nothing persisted
    DescribeTask { payload: Value },
    CategorizeTask { payload: Value },
    EstimateTask { payload: Value },
    AuditTask { payload: Value },

    // UserStory CRUD
    CreateStory { payload: Value },
    GetStory { id: i64 },
    ListStories,
    UpdateStory { id: i64, payload: Value },
    DeleteStory { id: i64 },

    // Story generation
    GenerateStory { prompt: String },
    DecomposeStory { id: i64 },

    /// Liveness check
    Ping,

    /// Request graceful shutdown
    Shutdown,
}

/// Responses from the service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ApiResponse {
    /// Success, with the requested or updated data
    Ok { data: Value },

    /// A new entity (or batch of entities) was persisted
    Created { data: Value },

    /// The payload failed validation; every violation is listed
    Invalid { violations: Vec<FieldViolation> },

    NotFound { message: String },

    /// AI generation failed; nothing was persisted
    GenerationFailed { message: String },

    StorageFailed { message: String },

    /// Pong response to ping
    Pong { version: String },

    /// Acknowledgment of a shutdown request
    ShuttingDown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_task_serialize() {
        let msg = ApiRequest::CreateTask {
            payload: json!({"title": "T"}),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"CreateTask","payload":{"title":"T"}}"#);
    }

    #[test]
    fn test_get_task_deserialize() {
        let json = r#"{"type":"GetTask","id":42}"#;
        let msg: ApiRequest = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ApiRequest::GetTask { id: 42 });
    }

    #[test]
    fn test_generate_story_serialize() {
        let msg = ApiRequest::GenerateStory {
            prompt: "order tracking".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"GenerateStory","prompt":"order tracking"}"#);
    }

    #[test]
    fn test_ping_serialize() {
        let json = serde_json::to_string(&ApiRequest::Ping).unwrap();
        assert_eq!(json, r#"{"type":"Ping"}"#);
    }

    #[test]
    fn test_invalid_response_serialize() {
        let resp = ApiResponse::Invalid {
            violations: vec![FieldViolation::new("priority", "Invalid priority: 'urgent'")],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"type":"Invalid","violations":[{"field":"priority","reason":"Invalid priority: 'urgent'"}]}"#
        );
    }

    #[test]
    fn test_pong_response_serialize() {
        let resp = ApiResponse::Pong {
            version: "1.0.0".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"type":"Pong","version":"1.0.0"}"#);
    }

    #[test]
    fn test_roundtrip_requests() {
        let messages = vec![
            ApiRequest::UpdateTask {
                id: 1,
                payload: json!({"status": "done"}),
            },
            ApiRequest::DeleteStory { id: 9 },
            ApiRequest::DecomposeStory { id: 3 },
            ApiRequest::ListTasks,
            ApiRequest::Shutdown,
        ];

        for msg in messages {
            let json = serde_json::to_string(&msg).unwrap();
            let parsed: ApiRequest = serde_json::from_str(&json).unwrap();
            assert_eq!(msg, parsed);
        }
    }

    #[test]
    fn test_roundtrip_responses() {
        let responses = vec![
            ApiResponse::Ok { data: json!([1, 2]) },
            ApiResponse::Created { data: json!({"id": 1}) },
            ApiResponse::NotFound {
                message: "Task 7".to_string(),
            },
            ApiResponse::GenerationFailed {
                message: "no content".to_string(),
            },
            ApiResponse::ShuttingDown,
        ];

        for resp in responses {
            let json = serde_json::to_string(&resp).unwrap();
            let parsed: ApiResponse = serde_json::from_str(&json).unwrap();
            assert_eq!(resp, parsed);
        }
    }
}
