//! StoryGenerator - a UserStory from a free-form prompt
//!
//! One schema-constrained creative completion produces a complete story
//! draft, which is then validated and persisted exactly like human input.

use std::sync::Arc;

use tracing::{debug, info};

use super::GenerateError;
use crate::domain::UserStory;
use crate::llm::{CompletionRequest, Intent, LlmClient, Message, ResponseSchema};
use crate::state::StateManager;
use crate::validation::{build_story, story_draft_from_value};

const GENERATE_PROMPT: &str = "You are an expert software project management assistant. \
    From the request that follows, write a complete user story. Fill in the \
    project name, the role (\"As a ...\"), the goal (\"I want ...\"), the \
    reason (\"so that ...\"), a short description, a priority (low, medium, \
    high or blocking), story points between 1 and 8, and an estimated effort \
    in hours. Respond with JSON only.";

fn user_story_schema() -> ResponseSchema {
    ResponseSchema {
        name: "user_story".to_string(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "project": { "type": "string" },
                "role": { "type": "string" },
                "goal": { "type": "string" },
                "reason": { "type": "string" },
                "description": { "type": "string" },
                "priority": {
                    "type": "string",
                    "enum": ["low", "medium", "high", "blocking"]
                },
                "story_points": { "type": "integer", "minimum": 1, "maximum": 8 },
                "effort_hours": { "type": "number" }
            },
            "required": ["project", "role", "goal", "reason", "description", "priority", "story_points", "effort_hours"],
            "additionalProperties": false
        }),
    }
}

/// Generates and persists UserStories from natural-language prompts
pub struct StoryGenerator {
    llm: Arc<dyn LlmClient>,
    state: StateManager,
}

impl StoryGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, state: StateManager) -> Self {
        Self { llm, state }
    }

    /// Generate a story from the prompt, validate it, and persist it
    pub async fn generate(&self, prompt: &str) -> Result<UserStory, GenerateError> {
        info!(prompt_chars = prompt.len(), "Generating user story from prompt");

        let request = CompletionRequest {
            system_prompt: GENERATE_PROMPT.to_string(),
            messages: vec![Message::user(prompt.to_string())],
            intent: Intent::Creative,
            schema: Some(user_story_schema()),
        };

        let response = self.llm.complete(request).await?;
        let content = response.content.ok_or(GenerateError::EmptyResponse)?;
        debug!(chars = content.len(), "generate: parsing model output");

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| GenerateError::InvalidOutput(e.to_string()))?;
        let draft = story_draft_from_value(&value).map_err(GenerateError::Rejected)?;
        let story = build_story(&draft).map_err(GenerateError::Rejected)?;

        let created = self.state.create_story(story).await?;
        info!(story_id = %created.id, "generate: story persisted");
        Ok(created)
    }
}
