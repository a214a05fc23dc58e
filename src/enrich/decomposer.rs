//! StoryDecomposer - LLM-driven decomposition of UserStories into Tasks
//!
//! One schema-constrained completion turns a story into 2-4 task drafts.
//! Every draft is stamped with the story id and strict-validated; the batch
//! is persisted atomically only when all of them pass.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use super::GenerateError;
use crate::domain::{NewTask, Task, UserStory};
use crate::llm::{CompletionRequest, Intent, LlmClient, Message, ResponseSchema};
use crate::state::StateManager;
use crate::validation::{build_task, task_draft_from_value};

const DECOMPOSE_PROMPT: &str = "You are an expert software project management assistant. \
    Break the following user story down into between 2 and 4 concrete, \
    independently workable tasks. Each task needs a title, a description, a \
    priority (low, medium, high or blocking), an estimated effort in hours, \
    a status of \"pending\" and an assignee. Keep each task under 200 words \
    and the whole response under 800 words. Respond with JSON only.";

/// Minimum and maximum number of tasks a decomposition may produce
const TASK_RANGE: std::ops::RangeInclusive<usize> = 2..=4;

#[derive(Debug, Deserialize)]
struct DecompositionOutput {
    tasks: Vec<serde_json::Value>,
}

fn task_breakdown_schema() -> ResponseSchema {
    ResponseSchema {
        name: "task_breakdown".to_string(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "tasks": {
                    "type": "array",
                    "minItems": 2,
                    "maxItems": 4,
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "description": { "type": "string" },
                            "priority": {
                                "type": "string",
                                "enum": ["low", "medium", "high", "blocking"]
                            },
                            "effort_hours": { "type": "number" },
                            "status": { "type": "string", "enum": ["pending"] },
                            "assigned_to": { "type": "string" }
                        },
                        "required": ["title", "description", "priority", "effort_hours", "status", "assigned_to"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["tasks"],
            "additionalProperties": false
        }),
    }
}

/// Breaks UserStories into persisted Tasks
pub struct StoryDecomposer {
    llm: Arc<dyn LlmClient>,
    state: StateManager,
}

impl StoryDecomposer {
    pub fn new(llm: Arc<dyn LlmClient>, state: StateManager) -> Self {
        Self { llm, state }
    }

    /// Decompose a story into tasks and persist them atomically
    pub async fn decompose(&self, story: &UserStory) -> Result<Vec<Task>, GenerateError> {
        info!(story_id = %story.id, "Decomposing user story into tasks");

        let output = self.get_decomposition(story).await?;

        if !TASK_RANGE.contains(&output.tasks.len()) {
            return Err(GenerateError::InvalidOutput(format!(
                "expected 2 to 4 tasks, model produced {}",
                output.tasks.len()
            )));
        }

        // All drafts must pass strict validation before anything persists.
        let mut new_tasks: Vec<NewTask> = Vec::with_capacity(output.tasks.len());
        for value in &output.tasks {
            let mut draft = task_draft_from_value(value).map_err(GenerateError::Rejected)?;
            draft.user_story_id = Some(story.id);
            new_tasks.push(build_task(&draft).map_err(GenerateError::Rejected)?);
        }

        let created = self.state.create_tasks(new_tasks).await?;
        info!(story_id = %story.id, task_count = created.len(), "Story decomposed");
        Ok(created)
    }

    async fn get_decomposition(&self, story: &UserStory) -> Result<DecompositionOutput, GenerateError> {
        let user_message = format!(
            "Project: {}\nRole: {}\nGoal: {}\nReason: {}\nDescription: {}\nPriority: {}\n\
             Story points: {}\nEstimated effort: {} hours\nBreak this story into tasks.",
            story.project,
            story.role,
            story.goal,
            story.reason,
            story.description,
            story.priority,
            story.story_points,
            story.effort_hours
        );

        let request = CompletionRequest {
            system_prompt: DECOMPOSE_PROMPT.to_string(),
            messages: vec![Message::user(user_message)],
            intent: Intent::Creative,
            schema: Some(task_breakdown_schema()),
        };

        let response = self.llm.complete(request).await?;
        let content = response.content.ok_or(GenerateError::EmptyResponse)?;
        debug!(chars = content.len(), "get_decomposition: parsing model output");

        serde_json::from_str(&content).map_err(|e| GenerateError::InvalidOutput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::MockLlmClient;
    use crate::state::Store;
    use chrono::Utc;

    fn sample_story() -> UserStory {
        UserStory {
            id: 7,
            project: "Demo".to_string(),
            role: "As a user".to_string(),
            goal: "I want to register".to_string(),
            reason: "so that I can log in".to_string(),
            description: "Registration flow".to_string(),
            priority: Priority::High,
            story_points: 5,
            effort_hours: 12.0,
            created_at: Utc::now(),
        }
    }

    fn decomposer(responses: Vec<CompletionResponse>) -> (StoryDecomposer, StateManager, Arc<MockLlmClient>) {
        let state = StateManager::spawn_with_store(Store::open_in_memory().unwrap());
        let mock = Arc::new(MockLlmClient::new(responses));
        (StoryDecomposer::new(mock.clone(), state.clone()), state, mock)
    }

    fn task_json(title: &str) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "description": "Generated",
            "priority": "medium",
            "effort_hours": 3,
            "status": "pending",
            "assigned_to": "unassigned"
        })
    }

    #[tokio::test]
    async fn test_decompose_persists_all_tasks_with_story_id() {
        let output = serde_json::json!({"tasks": [task_json("A"), task_json("B"), task_json("C")]});
        let (decomposer, state, mock) = decomposer(vec![CompletionResponse::text(output.to_string())]);

        let created = decomposer.decompose(&sample_story()).await.unwrap();
        assert_eq!(created.len(), 3);
        assert!(created.iter().all(|t| t.user_story_id == Some(7)));

        assert_eq!(state.list_tasks().await.unwrap().len(), 3);

        let request = &mock.requests()[0];
        assert_eq!(request.intent, Intent::Creative);
        assert_eq!(request.schema.as_ref().unwrap().name, "task_breakdown");
        assert!(request.messages[0].content.contains("I want to register"));
    }

    #[tokio::test]
    async fn test_decompose_prompt_bounds_count_and_length() {
        let output = serde_json::json!({"tasks": [task_json("A"), task_json("B")]});
        let (decomposer, _, mock) = decomposer(vec![CompletionResponse::text(output.to_string())]);

        decomposer.decompose(&sample_story()).await.unwrap();

        let system = &mock.requests()[0].system_prompt;
        assert!(system.contains("between 2 and 4"));
        assert!(system.contains("under 200 words"));
        assert!(system.contains("under 800 words"));
    }

    #[tokio::test]
    async fn test_decompose_rejects_wrong_count() {
        let output = serde_json::json!({"tasks": [task_json("only one")]});
        let (decomposer, state, _) = decomposer(vec![CompletionResponse::text(output.to_string())]);

        let result = decomposer.decompose(&sample_story()).await;
        assert!(matches!(result, Err(GenerateError::InvalidOutput(_))));
        assert!(state.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decompose_persists_nothing_when_one_task_invalid() {
        let mut bad = task_json("bad");
        bad["priority"] = serde_json::json!("urgent");
        let output = serde_json::json!({"tasks": [task_json("good"), bad]});
        let (decomposer, state, _) = decomposer(vec![CompletionResponse::text(output.to_string())]);

        let result = decomposer.decompose(&sample_story()).await;
        assert!(matches!(result, Err(GenerateError::Rejected(_))));
        assert!(state.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decompose_rejects_non_json_content() {
        let (decomposer, state, _) = decomposer(vec![CompletionResponse::text("here are your tasks!")]);

        let result = decomposer.decompose(&sample_story()).await;
        assert!(matches!(result, Err(GenerateError::InvalidOutput(_))));
        assert!(state.list_tasks().await.unwrap().is_empty());
    }
}
