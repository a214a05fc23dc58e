//! TaskEnricher - LLM-generated Task fields
//!
//! Four single-field generators over a task draft: description, category,
//! effort estimate, and the two-step risk audit. Each generator checks its
//! own context requirements, builds a fixed system prompt plus a user
//! message carrying only the fields that are present, and makes exactly
//! one completion per step.

use std::sync::Arc;

use tracing::{debug, info};

use super::GenerateError;
use crate::domain::TaskDraft;
use crate::llm::{CompletionRequest, Intent, LlmClient, Message};

const DESCRIBE_PROMPT: &str = "You are an expert software project management assistant. \
    Generate a clear, useful description for the task whose fields follow. \
    Base the description primarily on the title; the remaining fields are \
    optional context. Return only the text for the description field, avoid \
    repeating information already present in the other fields, and stay \
    under 150 words.";

const CATEGORIZE_PROMPT: &str = "You are an expert software project management assistant. \
    Analyze the task information and classify it into exactly one of the \
    following categories: Backend, Frontend, Testing, Documentation, Other. \
    Use Other only when none of the rest applies. Return only the category name.";

const ESTIMATE_PROMPT: &str = "You are an expert software project management assistant. \
    Estimate the effort in hours a software engineer would need to complete \
    the task, based on its title, description and category. Return only an \
    integer or decimal number of hours, with no additional text.";

const RISK_ANALYSIS_PROMPT: &str = "You are an expert in software project management. \
    Analyze the possible risks of the following task and return only the \
    risk analysis, with no additional text. No more than 100 words.";

const RISK_MITIGATION_PROMPT: &str = "You are an expert in software project management. \
    From the risk analysis and the task data, produce a risk mitigation plan. \
    Return only the plan, with no additional text. No more than 100 words.";

/// The two risk fields produced together by [`TaskEnricher::audit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditResult {
    pub risk_analysis: String,
    pub risk_mitigation: String,
}

/// Generates individual Task fields through the LLM
pub struct TaskEnricher {
    llm: Arc<dyn LlmClient>,
}

impl TaskEnricher {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    async fn complete_text(&self, system_prompt: &str, user_message: String, intent: Intent) -> Result<String, GenerateError> {
        let request = CompletionRequest {
            system_prompt: system_prompt.to_string(),
            messages: vec![Message::user(user_message)],
            intent,
            schema: None,
        };
        let response = self.llm.complete(request).await?;
        response
            .content
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(GenerateError::EmptyResponse)
    }

    /// Generate a description from the title plus any optional context
    pub async fn describe(&self, draft: &TaskDraft) -> Result<String, GenerateError> {
        debug!("describe: called");
        let title = draft.title.as_deref().ok_or(GenerateError::MissingField("title"))?;

        let mut user_message = format!("Title: {} ", title);
        if let Some(priority) = &draft.priority {
            user_message.push_str(&format!("Priority: {} ", priority));
        }
        if let Some(hours) = draft.effort_hours {
            user_message.push_str(&format!("Estimated effort: {} hours ", hours));
        }
        if let Some(category) = &draft.category {
            user_message.push_str(&format!("Category: {} ", category));
        }
        if let Some(risk) = &draft.risk_analysis {
            user_message.push_str(&format!("Risk analysis: {} ", risk));
        }
        if let Some(mitigation) = &draft.risk_mitigation {
            user_message.push_str(&format!("Risk mitigation: {} ", mitigation));
        }
        user_message.push_str("Please generate a detailed, professional description for this task.");

        let description = self.complete_text(DESCRIBE_PROMPT, user_message, Intent::Creative).await?;
        info!(chars = description.len(), "describe: generated");
        Ok(description)
    }

    /// Classify the task; the model's answer is returned verbatim and only
    /// the entity validator decides whether it is a legal category
    pub async fn categorize(&self, draft: &TaskDraft) -> Result<String, GenerateError> {
        debug!("categorize: called");
        let title = draft.title.as_deref().ok_or(GenerateError::MissingField("title"))?;
        let description = draft
            .description
            .as_deref()
            .ok_or(GenerateError::MissingField("description"))?;

        let mut user_message = format!("Title: {}, Description: {} ", title, description);
        if let Some(risk) = &draft.risk_analysis {
            user_message.push_str(&format!("Risk analysis: {} ", risk));
        }
        if let Some(mitigation) = &draft.risk_mitigation {
            user_message.push_str(&format!("Risk mitigation: {} ", mitigation));
        }
        user_message.push_str("Which category does this task belong to?");

        let category = self.complete_text(CATEGORIZE_PROMPT, user_message, Intent::Analytical).await?;
        info!(%category, "categorize: generated");
        Ok(category)
    }

    /// Estimate the effort in hours; accepts a decimal with comma or dot
    /// separator, anything else fails with the offending text
    pub async fn estimate_effort(&self, draft: &TaskDraft) -> Result<f64, GenerateError> {
        debug!("estimate_effort: called");
        let title = draft.title.as_deref().ok_or(GenerateError::MissingField("title"))?;
        let description = draft
            .description
            .as_deref()
            .ok_or(GenerateError::MissingField("description"))?;
        let category = draft
            .category
            .as_deref()
            .ok_or(GenerateError::MissingField("category"))?;

        let user_message = format!(
            "Title: {}\nDescription: {}\nCategory: {}\nHow many hours do you estimate this task will take?",
            title, description, category
        );

        let raw = self.complete_text(ESTIMATE_PROMPT, user_message, Intent::Analytical).await?;
        let hours = raw
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| GenerateError::BadEstimate(raw.clone()))?;

        info!(%hours, "estimate_effort: generated");
        Ok(hours)
    }

    /// Two-step risk audit: analysis first, then a mitigation plan written
    /// against that analysis. Both fields come back together or the whole
    /// audit fails.
    pub async fn audit(&self, draft: &TaskDraft) -> Result<AuditResult, GenerateError> {
        debug!("audit: called");
        let title = draft.title.as_deref().ok_or(GenerateError::MissingField("title"))?;
        let description = draft
            .description
            .as_deref()
            .ok_or(GenerateError::MissingField("description"))?;
        let priority = draft.priority.as_deref().ok_or(GenerateError::MissingField("priority"))?;
        let category = draft.category.as_deref().ok_or(GenerateError::MissingField("category"))?;
        let assigned_to = draft.assigned_to.as_deref().unwrap_or("");

        let task_context = format!(
            "Title: {}\nDescription: {}\nPriority: {}\nCategory: {}\nAssignee: {}\n",
            title, description, priority, category, assigned_to
        );

        let risk_analysis = self
            .complete_text(
                RISK_ANALYSIS_PROMPT,
                format!("{}What risks could arise in this task?", task_context),
                Intent::Analytical,
            )
            .await?;

        let risk_mitigation = self
            .complete_text(
                RISK_MITIGATION_PROMPT,
                format!(
                    "{}Risk analysis: {}\nWhat mitigation plan do you propose for these risks?",
                    task_context, risk_analysis
                ),
                Intent::Analytical,
            )
            .await?;

        info!("audit: generated both risk fields");
        Ok(AuditResult {
            risk_analysis,
            risk_mitigation,
        })
    }
}
