//! Service - request orchestration
//!
//! Routes each API request through the entity validator, the enrichers and
//! the state manager, and maps every failure kind onto a response kind.
//! The LLM client is optional; CRUD keeps working without one and AI
//! operations report a generation failure.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::messages::{ApiRequest, ApiResponse};
use crate::enrich::{GenerateError, StoryDecomposer, StoryGenerator, TaskEnricher};
use crate::llm::LlmClient;
use crate::state::{StateError, StateManager};
use crate::validation::{
    FieldViolation, ValidationMode, build_story, build_task, story_draft_from_value, task_draft_from_value,
    validate_story, validate_task,
};

/// The service facade behind the socket listener
#[derive(Clone)]
pub struct Service {
    state: StateManager,
    llm: Option<Arc<dyn LlmClient>>,
}

fn json_of<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn storage_error(e: StateError) -> ApiResponse {
    match e {
        StateError::NotFound(what) => ApiResponse::NotFound { message: what },
        other => {
            warn!(error = %other, "storage operation failed");
            ApiResponse::StorageFailed {
                message: other.to_string(),
            }
        }
    }
}

fn generation_error(e: GenerateError) -> ApiResponse {
    match e {
        // The caller's payload lacked required context; that is their error,
        // not the model's.
        GenerateError::MissingField(field) => ApiResponse::Invalid {
            violations: vec![FieldViolation::new(field, format!("Missing field: {}", field))],
        },
        GenerateError::State(e) => storage_error(e),
        other => {
            warn!(error = %other, "generation failed");
            ApiResponse::GenerationFailed {
                message: other.to_string(),
            }
        }
    }
}

impl Service {
    pub fn new(state: StateManager, llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { state, llm }
    }

    fn require_llm(&self) -> Result<Arc<dyn LlmClient>, ApiResponse> {
        self.llm.clone().ok_or_else(|| ApiResponse::GenerationFailed {
            message: "No LLM client configured".to_string(),
        })
    }

    /// Handle one request and produce its response
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        debug!(?request, "handle: called");
        match request {
            ApiRequest::CreateTask { payload } => self.create_task(payload).await,
            ApiRequest::GetTask { id } => self.get_task(id).await,
            ApiRequest::ListTasks => self.list_tasks().await,
            ApiRequest::UpdateTask { id, payload } => self.update_task(id, payload).await,
            ApiRequest::DeleteTask { id } => self.delete_task(id).await,
            ApiRequest::DescribeTask { payload } => self.describe_task(payload).await,
            ApiRequest::CategorizeTask { payload } => self.categorize_task(payload).await,
            ApiRequest::EstimateTask { payload } => self.estimate_task(payload).await,
            ApiRequest::AuditTask { payload } => self.audit_task(payload).await,
            ApiRequest::CreateStory { payload } => self.create_story(payload).await,
            ApiRequest::GetStory { id } => self.get_story(id).await,
            ApiRequest::ListStories => self.list_stories().await,
            ApiRequest::UpdateStory { id, payload } => self.update_story(id, payload).await,
            ApiRequest::DeleteStory { id } => self.delete_story(id).await,
            ApiRequest::GenerateStory { prompt } => self.generate_story(&prompt).await,
            ApiRequest::DecomposeStory { id } => self.decompose_story(id).await,
            ApiRequest::Ping => ApiResponse::Pong {
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            ApiRequest::Shutdown => ApiResponse::ShuttingDown,
        }
    }

    // === Task CRUD ===

    async fn create_task(&self, payload: Value) -> ApiResponse {
        let draft = match task_draft_from_value(&payload) {
            Ok(d) => d,
            Err(violations) => return ApiResponse::Invalid { violations },
        };
        let task = match build_task(&draft) {
            Ok(t) => t,
            Err(violations) => return ApiResponse::Invalid { violations },
        };
        match self.state.create_task(task).await {
            Ok(created) => ApiResponse::Created { data: json_of(&created) },
            Err(e) => storage_error(e),
        }
    }

    async fn get_task(&self, id: i64) -> ApiResponse {
        match self.state.get_task(id).await {
            Ok(Some(task)) => ApiResponse::Ok { data: json_of(&task) },
            Ok(None) => ApiResponse::NotFound {
                message: format!("Task {}", id),
            },
            Err(e) => storage_error(e),
        }
    }

    async fn list_tasks(&self) -> ApiResponse {
        match self.state.list_tasks().await {
            Ok(tasks) => ApiResponse::Ok { data: json_of(&tasks) },
            Err(e) => storage_error(e),
        }
    }

    /// Partial update: validate the patch, merge it onto the stored task,
    /// then strict-validate the merged whole before persisting
    async fn update_task(&self, id: i64, payload: Value) -> ApiResponse {
        let patch = match task_draft_from_value(&payload) {
            Ok(d) => d,
            Err(violations) => return ApiResponse::Invalid { violations },
        };
        if let Err(violations) = validate_task(&patch, ValidationMode::Partial) {
            return ApiResponse::Invalid { violations };
        }

        let existing = match self.state.get_task(id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                return ApiResponse::NotFound {
                    message: format!("Task {}", id),
                };
            }
            Err(e) => return storage_error(e),
        };

        let merged = existing.to_draft().merged_with(&patch);
        let task = match build_task(&merged) {
            Ok(t) => t,
            Err(violations) => return ApiResponse::Invalid { violations },
        };

        match self.state.update_task(id, task).await {
            Ok(updated) => ApiResponse::Ok { data: json_of(&updated) },
            Err(e) => storage_error(e),
        }
    }

    async fn delete_task(&self, id: i64) -> ApiResponse {
        match self.state.delete_task(id).await {
            Ok(()) => ApiResponse::Ok { data: Value::Null },
            Err(e) => storage_error(e),
        }
    }

    // === Task enrichment ===
    //
    // Each enrichment takes a payload, generates one field (two for audit),
    // and returns the enriched payload. Nothing is persisted; the caller
    // decides what to do with the result.

    async fn describe_task(&self, payload: Value) -> ApiResponse {
        let mut draft = match task_draft_from_value(&payload) {
            Ok(d) => d,
            Err(violations) => return ApiResponse::Invalid { violations },
        };
        let llm = match self.require_llm() {
            Ok(llm) => llm,
            Err(resp) => return resp,
        };
        match TaskEnricher::new(llm).describe(&draft).await {
            Ok(description) => {
                draft.description = Some(description);
                ApiResponse::Ok { data: json_of(&draft) }
            }
            Err(e) => generation_error(e),
        }
    }

    async fn categorize_task(&self, payload: Value) -> ApiResponse {
        let mut draft = match task_draft_from_value(&payload) {
            Ok(d) => d,
            Err(violations) => return ApiResponse::Invalid { violations },
        };
        let llm = match self.require_llm() {
            Ok(llm) => llm,
            Err(resp) => return resp,
        };
        match TaskEnricher::new(llm).categorize(&draft).await {
            Ok(category) => {
                // Verbatim model output; it is only checked against the
                // closed set if this draft is later submitted for create
                // or update.
                draft.category = Some(category);
                ApiResponse::Ok { data: json_of(&draft) }
            }
            Err(e) => generation_error(e),
        }
    }

    async fn estimate_task(&self, payload: Value) -> ApiResponse {
        let mut draft = match task_draft_from_value(&payload) {
            Ok(d) => d,
            Err(violations) => return ApiResponse::Invalid { violations },
        };
        let llm = match self.require_llm() {
            Ok(llm) => llm,
            Err(resp) => return resp,
        };
        match TaskEnricher::new(llm).estimate_effort(&draft).await {
            Ok(hours) => {
                draft.effort_hours = Some(hours);
                ApiResponse::Ok { data: json_of(&draft) }
            }
            Err(e) => generation_error(e),
        }
    }

    async fn audit_task(&self, payload: Value) -> ApiResponse {
        let mut draft = match task_draft_from_value(&payload) {
            Ok(d) => d,
            Err(violations) => return ApiResponse::Invalid { violations },
        };
        let llm = match self.require_llm() {
            Ok(llm) => llm,
            Err(resp) => return resp,
        };
        match TaskEnricher::new(llm).audit(&draft).await {
            Ok(audit) => {
                draft.risk_analysis = Some(audit.risk_analysis);
                draft.risk_mitigation = Some(audit.risk_mitigation);
                ApiResponse::Ok { data: json_of(&draft) }
            }
            Err(e) => generation_error(e),
        }
    }

    // === UserStory CRUD ===

    async fn create_story(&self, payload: Value) -> ApiResponse {
        let draft = match story_draft_from_value(&payload) {
            Ok(d) => d,
            Err(violations) => return ApiResponse::Invalid { violations },
        };
        let story = match build_story(&draft) {
            Ok(s) => s,
            Err(violations) => return ApiResponse::Invalid { violations },
        };
        match self.state.create_story(story).await {
            Ok(created) => ApiResponse::Created { data: json_of(&created) },
            Err(e) => storage_error(e),
        }
    }

    async fn get_story(&self, id: i64) -> ApiResponse {
        match self.state.get_story(id).await {
            Ok(Some(story)) => ApiResponse::Ok { data: json_of(&story) },
            Ok(None) => ApiResponse::NotFound {
                message: format!("UserStory {}", id),
            },
            Err(e) => storage_error(e),
        }
    }

    async fn list_stories(&self) -> ApiResponse {
        match self.state.list_stories().await {
            Ok(stories) => ApiResponse::Ok { data: json_of(&stories) },
            Err(e) => storage_error(e),
        }
    }

    async fn update_story(&self, id: i64, payload: Value) -> ApiResponse {
        let patch = match story_draft_from_value(&payload) {
            Ok(d) => d,
            Err(violations) => return ApiResponse::Invalid { violations },
        };
        if let Err(violations) = validate_story(&patch, ValidationMode::Partial) {
            return ApiResponse::Invalid { violations };
        }

        let existing = match self.state.get_story(id).await {
            Ok(Some(story)) => story,
            Ok(None) => {
                return ApiResponse::NotFound {
                    message: format!("UserStory {}", id),
                };
            }
            Err(e) => return storage_error(e),
        };

        let merged = existing.to_draft().merged_with(&patch);
        let story = match build_story(&merged) {
            Ok(s) => s,
            Err(violations) => return ApiResponse::Invalid { violations },
        };

        match self.state.update_story(id, story).await {
            Ok(updated) => ApiResponse::Ok { data: json_of(&updated) },
            Err(e) => storage_error(e),
        }
    }

    async fn delete_story(&self, id: i64) -> ApiResponse {
        match self.state.delete_story(id).await {
            Ok(()) => ApiResponse::Ok { data: Value::Null },
            Err(e) => storage_error(e),
        }
    }

    // === Story generation ===

    async fn generate_story(&self, prompt: &str) -> ApiResponse {
        let llm = match self.require_llm() {
            Ok(llm) => llm,
            Err(resp) => return resp,
        };
        match StoryGenerator::new(llm, self.state.clone()).generate(prompt).await {
            Ok(story) => ApiResponse::Created { data: json_of(&story) },
            Err(e) => generation_error(e),
        }
    }

    async fn decompose_story(&self, id: i64) -> ApiResponse {
        let story = match self.state.get_story(id).await {
            Ok(Some(story)) => story,
            Ok(None) => {
                return ApiResponse::NotFound {
                    message: format!("UserStory {}", id),
                };
            }
            Err(e) => return storage_error(e),
        };
        let llm = match self.require_llm() {
            Ok(llm) => llm,
            Err(resp) => return resp,
        };
        match StoryDecomposer::new(llm, self.state.clone()).decompose(&story).await {
            Ok(tasks) => ApiResponse::Created { data: json_of(&tasks) },
            Err(e) => generation_error(e),
        }
    }
}
