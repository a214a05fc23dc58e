//! Task entity, its closed enumerations, and the untrusted draft form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority level for Tasks and UserStories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Blocking,
}

impl Priority {
    /// Wire value for this priority
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Blocking => "blocking",
        }
    }

    /// All wire values, for validation error messages
    pub const VALUES: [&'static str; 4] = ["low", "medium", "high", "blocking"];
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    // Case-sensitive by contract: enum values match the closed set by value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "blocking" => Ok(Self::Blocking),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Workflow status for Tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    InReview,
    Done,
}

impl Status {
    /// Wire value for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::InReview => "in-review",
            Self::Done => "done",
        }
    }

    /// All wire values, for validation error messages
    pub const VALUES: [&'static str; 4] = ["pending", "in-progress", "in-review", "done"];
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "in-review" => Ok(Self::InReview),
            "done" => Ok(Self::Done),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Work category assigned to a Task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Backend,
    Frontend,
    Testing,
    Documentation,
    Other,
}

impl Category {
    /// Wire value for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backend => "Backend",
            Self::Frontend => "Frontend",
            Self::Testing => "Testing",
            Self::Documentation => "Documentation",
            Self::Other => "Other",
        }
    }

    /// All wire values, for prompts and validation error messages
    pub const VALUES: [&'static str; 5] = ["Backend", "Frontend", "Testing", "Documentation", "Other"];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Backend" => Ok(Self::Backend),
            "Frontend" => Ok(Self::Frontend),
            "Testing" => Ok(Self::Testing),
            "Documentation" => Ok(Self::Documentation),
            "Other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// A persisted, validated Task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned by the store on create
    pub id: i64,

    pub title: String,

    pub description: String,

    pub priority: Priority,

    /// Estimated effort in hours, non-negative
    pub effort_hours: f64,

    pub status: Status,

    pub assigned_to: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    /// Present iff risk_mitigation is present (produced together by audit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_analysis: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_mitigation: Option<String>,

    /// Foreign reference to the originating UserStory, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_story_id: Option<i64>,

    /// Set once at persistence, immutable afterwards
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Convert back into draft form for merge-then-revalidate updates
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            priority: Some(self.priority.to_string()),
            effort_hours: Some(self.effort_hours),
            status: Some(self.status.to_string()),
            assigned_to: Some(self.assigned_to.clone()),
            category: self.category.map(|c| c.to_string()),
            risk_analysis: self.risk_analysis.clone(),
            risk_mitigation: self.risk_mitigation.clone(),
            user_story_id: self.user_story_id,
        }
    }
}

/// A validated Task that has not been persisted yet (no id, no created_at)
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub effort_hours: f64,
    pub status: Status,
    pub assigned_to: String,
    pub category: Option<Category>,
    pub risk_analysis: Option<String>,
    pub risk_mitigation: Option<String>,
    pub user_story_id: Option<i64>,
}

/// Untrusted Task payload - human- or AI-submitted
///
/// Every field is optional and enum-valued fields are raw strings: AI output
/// is written here verbatim and trusted only once the entity validator has
/// turned the draft into a [`NewTask`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort_hours: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_analysis: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_mitigation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_story_id: Option<i64>,
}

impl TaskDraft {
    /// Overlay the fields present in `patch` onto this draft
    ///
    /// Fields absent from the patch keep their current value; this is the
    /// merge half of partial-update semantics (the merged whole is then
    /// re-validated strictly).
    pub fn merged_with(&self, patch: &TaskDraft) -> TaskDraft {
        TaskDraft {
            title: patch.title.clone().or_else(|| self.title.clone()),
            description: patch.description.clone().or_else(|| self.description.clone()),
            priority: patch.priority.clone().or_else(|| self.priority.clone()),
            effort_hours: patch.effort_hours.or(self.effort_hours),
            status: patch.status.clone().or_else(|| self.status.clone()),
            assigned_to: patch.assigned_to.clone().or_else(|| self.assigned_to.clone()),
            category: patch.category.clone().or_else(|| self.category.clone()),
            risk_analysis: patch.risk_analysis.clone().or_else(|| self.risk_analysis.clone()),
            risk_mitigation: patch.risk_mitigation.clone().or_else(|| self.risk_mitigation.clone()),
            user_story_id: patch.user_story_id.or(self.user_story_id),
        }
    }
}
