//! UserStory entity and its untrusted draft form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::Priority;

/// A persisted, validated UserStory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    /// Unique identifier, assigned by the store on create
    pub id: i64,

    pub project: String,

    /// "As a <role>"
    pub role: String,

    /// "I want <goal>"
    pub goal: String,

    /// "so that <reason>"
    pub reason: String,

    pub description: String,

    pub priority: Priority,

    /// Fibonacci-ish sizing, 1 through 8 inclusive
    pub story_points: i64,

    /// Estimated effort in hours, non-negative
    pub effort_hours: f64,

    /// Set once at persistence, immutable afterwards
    pub created_at: DateTime<Utc>,
}

impl UserStory {
    /// Convert back into draft form for merge-then-revalidate updates
    pub fn to_draft(&self) -> StoryDraft {
        StoryDraft {
            project: Some(self.project.clone()),
            role: Some(self.role.clone()),
            goal: Some(self.goal.clone()),
            reason: Some(self.reason.clone()),
            description: Some(self.description.clone()),
            priority: Some(self.priority.to_string()),
            story_points: Some(self.story_points),
            effort_hours: Some(self.effort_hours),
        }
    }
}

/// A validated UserStory that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewStory {
    pub project: String,
    pub role: String,
    pub goal: String,
    pub reason: String,
    pub description: String,
    pub priority: Priority,
    pub story_points: i64,
    pub effort_hours: f64,
}

/// Untrusted UserStory payload - human- or AI-submitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort_hours: Option<f64>,
}

impl StoryDraft {
    /// Overlay the fields present in `patch` onto this draft
    pub fn merged_with(&self, patch: &StoryDraft) -> StoryDraft {
        StoryDraft {
            project: patch.project.clone().or_else(|| self.project.clone()),
            role: patch.role.clone().or_else(|| self.role.clone()),
            goal: patch.goal.clone().or_else(|| self.goal.clone()),
            reason: patch.reason.clone().or_else(|| self.reason.clone()),
            description: patch.description.clone().or_else(|| self.description.clone()),
            priority: patch.priority.clone().or_else(|| self.priority.clone()),
            story_points: patch.story_points.or(self.story_points),
            effort_hours: patch.effort_hours.or(self.effort_hours),
        }
    }
}
