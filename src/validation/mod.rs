//! Entity validator
//!
//! The single trust boundary in front of persistence. Every payload - typed
//! in by a human or generated by the model - goes through here before it can
//! become a [`NewTask`] or [`NewStory`]. Violations are collected and
//! returned in bulk, never fail-fast, so the caller sees every problem at
//! once.
//!
//! Strict mode (create) requires every mandatory field; partial mode
//! (update) checks only the fields present in the payload. An update then
//! merges the patch onto the stored entity and re-validates the merged whole
//! strictly, so a partial update can never produce an entity that violates a
//! global invariant.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::{Category, NewStory, NewTask, Priority, Status, StoryDraft, TaskDraft};

/// How much of the payload must be there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Create: every mandatory field present and well-typed
    Strict,
    /// Update: only fields present in the payload are checked
    Partial,
}

/// A single violated field with a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

// === Lenient intake ===
//
// Payloads arrive as raw JSON. Intake coerces each known field into the
// draft's type (numeric strings like "2.5" are accepted, matching the
// original boundary's leniency), collects coercion failures per field, and
// ignores unknown fields as well as the store-owned id/created_at.

fn take_string(obj: &serde_json::Map<String, Value>, field: &str, errors: &mut Vec<FieldViolation>) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldViolation::new(field, format!("{} must be a string", field)));
            None
        }
    }
}

fn take_number(obj: &serde_json::Map<String, Value>, field: &str, errors: &mut Vec<FieldViolation>) -> Option<f64> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                errors.push(FieldViolation::new(field, format!("{} must be a number", field)));
                None
            }
        },
        Some(_) => {
            errors.push(FieldViolation::new(field, format!("{} must be a number", field)));
            None
        }
    }
}

fn take_integer(obj: &serde_json::Map<String, Value>, field: &str, errors: &mut Vec<FieldViolation>) -> Option<i64> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Some(v),
            None => {
                errors.push(FieldViolation::new(field, format!("{} must be an integer", field)));
                None
            }
        },
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(v) => Some(v),
            Err(_) => {
                errors.push(FieldViolation::new(field, format!("{} must be an integer", field)));
                None
            }
        },
        Some(_) => {
            errors.push(FieldViolation::new(field, format!("{} must be an integer", field)));
            None
        }
    }
}

fn as_object(payload: &Value) -> Result<&serde_json::Map<String, Value>, Vec<FieldViolation>> {
    payload
        .as_object()
        .ok_or_else(|| vec![FieldViolation::new("payload", "payload must be a JSON object")])
}

/// Coerce a raw JSON payload into a [`TaskDraft`], collecting type errors
pub fn task_draft_from_value(payload: &Value) -> Result<TaskDraft, Vec<FieldViolation>> {
    let obj = as_object(payload)?;
    let mut errors = Vec::new();

    let draft = TaskDraft {
        title: take_string(obj, "title", &mut errors),
        description: take_string(obj, "description", &mut errors),
        priority: take_string(obj, "priority", &mut errors),
        effort_hours: take_number(obj, "effort_hours", &mut errors),
        status: take_string(obj, "status", &mut errors),
        assigned_to: take_string(obj, "assigned_to", &mut errors),
        category: take_string(obj, "category", &mut errors),
        risk_analysis: take_string(obj, "risk_analysis", &mut errors),
        risk_mitigation: take_string(obj, "risk_mitigation", &mut errors),
        user_story_id: take_integer(obj, "user_story_id", &mut errors),
    };

    if errors.is_empty() { Ok(draft) } else { Err(errors) }
}

/// Coerce a raw JSON payload into a [`StoryDraft`], collecting type errors
pub fn story_draft_from_value(payload: &Value) -> Result<StoryDraft, Vec<FieldViolation>> {
    let obj = as_object(payload)?;
    let mut errors = Vec::new();

    let draft = StoryDraft {
        project: take_string(obj, "project", &mut errors),
        role: take_string(obj, "role", &mut errors),
        goal: take_string(obj, "goal", &mut errors),
        reason: take_string(obj, "reason", &mut errors),
        description: take_string(obj, "description", &mut errors),
        priority: take_string(obj, "priority", &mut errors),
        story_points: take_integer(obj, "story_points", &mut errors),
        effort_hours: take_number(obj, "effort_hours", &mut errors),
    };

    if errors.is_empty() { Ok(draft) } else { Err(errors) }
}

// === Field rules ===

fn check_missing(present: bool, field: &'static str, mode: ValidationMode, errors: &mut Vec<FieldViolation>) {
    if !present && mode == ValidationMode::Strict {
        errors.push(FieldViolation::new(field, format!("Missing field: {}", field)));
    }
}

fn check_priority(value: &Option<String>, errors: &mut Vec<FieldViolation>) {
    if let Some(p) = value
        && p.parse::<Priority>().is_err()
    {
        errors.push(FieldViolation::new(
            "priority",
            format!("Invalid priority: '{}' (expected one of {:?})", p, Priority::VALUES),
        ));
    }
}

fn check_effort_hours(value: Option<f64>, errors: &mut Vec<FieldViolation>) {
    if let Some(h) = value
        && (h < 0.0 || !h.is_finite())
    {
        errors.push(FieldViolation::new(
            "effort_hours",
            "effort_hours must be a non-negative number",
        ));
    }
}

/// Validate a task draft against the closed sets and numeric ranges
///
/// In partial mode only present fields are checked; in strict mode every
/// mandatory field must also be present. The risk-field pairing invariant is
/// a whole-entity rule, so it is checked only in strict mode (a partial
/// patch is always merged and re-validated strictly before persistence).
pub fn validate_task(draft: &TaskDraft, mode: ValidationMode) -> Result<(), Vec<FieldViolation>> {
    debug!(?mode, "validate_task: called");
    let mut errors = Vec::new();

    check_missing(draft.title.is_some(), "title", mode, &mut errors);
    check_missing(draft.description.is_some(), "description", mode, &mut errors);
    check_missing(draft.priority.is_some(), "priority", mode, &mut errors);
    check_missing(draft.effort_hours.is_some(), "effort_hours", mode, &mut errors);
    check_missing(draft.status.is_some(), "status", mode, &mut errors);
    check_missing(draft.assigned_to.is_some(), "assigned_to", mode, &mut errors);

    if let Some(title) = &draft.title
        && title.trim().is_empty()
    {
        errors.push(FieldViolation::new("title", "title must not be empty"));
    }

    check_priority(&draft.priority, &mut errors);

    if let Some(s) = &draft.status
        && s.parse::<Status>().is_err()
    {
        errors.push(FieldViolation::new(
            "status",
            format!("Invalid status: '{}' (expected one of {:?})", s, Status::VALUES),
        ));
    }

    check_effort_hours(draft.effort_hours, &mut errors);

    // AI-written categories land here as raw text; anything outside the
    // closed set is rejected rather than coerced to "Other".
    if let Some(c) = &draft.category
        && c.parse::<Category>().is_err()
    {
        errors.push(FieldViolation::new(
            "category",
            format!("Invalid category: '{}' (expected one of {:?})", c, Category::VALUES),
        ));
    }

    if mode == ValidationMode::Strict && draft.risk_analysis.is_some() != draft.risk_mitigation.is_some() {
        let absent = if draft.risk_analysis.is_none() {
            "risk_analysis"
        } else {
            "risk_mitigation"
        };
        errors.push(FieldViolation::new(
            absent,
            "risk_analysis and risk_mitigation must be provided together",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        debug!(violations = errors.len(), "validate_task: rejected");
        Err(errors)
    }
}

/// Validate a story draft
pub fn validate_story(draft: &StoryDraft, mode: ValidationMode) -> Result<(), Vec<FieldViolation>> {
    debug!(?mode, "validate_story: called");
    let mut errors = Vec::new();

    check_missing(draft.project.is_some(), "project", mode, &mut errors);
    check_missing(draft.role.is_some(), "role", mode, &mut errors);
    check_missing(draft.goal.is_some(), "goal", mode, &mut errors);
    check_missing(draft.reason.is_some(), "reason", mode, &mut errors);
    check_missing(draft.description.is_some(), "description", mode, &mut errors);
    check_missing(draft.priority.is_some(), "priority", mode, &mut errors);
    check_missing(draft.story_points.is_some(), "story_points", mode, &mut errors);
    check_missing(draft.effort_hours.is_some(), "effort_hours", mode, &mut errors);

    check_priority(&draft.priority, &mut errors);
    check_effort_hours(draft.effort_hours, &mut errors);

    if let Some(points) = draft.story_points
        && !(1..=8).contains(&points)
    {
        errors.push(FieldViolation::new(
            "story_points",
            format!("story_points must be between 1 and 8, got {}", points),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        debug!(violations = errors.len(), "validate_story: rejected");
        Err(errors)
    }
}

/// Strict-validate a task draft and construct the typed entity
pub fn build_task(draft: &TaskDraft) -> Result<NewTask, Vec<FieldViolation>> {
    validate_task(draft, ValidationMode::Strict)?;

    // Unwraps below cannot fire: strict validation guarantees presence and
    // enum membership for every field consumed here.
    Ok(NewTask {
        title: draft.title.clone().unwrap_or_default(),
        description: draft.description.clone().unwrap_or_default(),
        priority: draft.priority.as_deref().unwrap_or_default().parse().unwrap_or_default(),
        effort_hours: draft.effort_hours.unwrap_or_default(),
        status: draft.status.as_deref().unwrap_or_default().parse().unwrap_or_default(),
        assigned_to: draft.assigned_to.clone().unwrap_or_default(),
        category: draft.category.as_deref().and_then(|c| c.parse().ok()),
        risk_analysis: draft.risk_analysis.clone(),
        risk_mitigation: draft.risk_mitigation.clone(),
        user_story_id: draft.user_story_id,
    })
}

/// Strict-validate a story draft and construct the typed entity
pub fn build_story(draft: &StoryDraft) -> Result<NewStory, Vec<FieldViolation>> {
    validate_story(draft, ValidationMode::Strict)?;

    Ok(NewStory {
        project: draft.project.clone().unwrap_or_default(),
        role: draft.role.clone().unwrap_or_default(),
        goal: draft.goal.clone().unwrap_or_default(),
        reason: draft.reason.clone().unwrap_or_default(),
        description: draft.description.clone().unwrap_or_default(),
        priority: draft.priority.as_deref().unwrap_or_default().parse().unwrap_or_default(),
        story_points: draft.story_points.unwrap_or_default(),
        effort_hours: draft.effort_hours.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_task_payload() -> Value {
        json!({
            "title": "T",
            "description": "D",
            "priority": "high",
            "effort_hours": 2,
            "status": "pending",
            "assigned_to": "Juan"
        })
    }

    #[test]
    fn test_strict_create_round_trips_enums() {
        let draft = task_draft_from_value(&full_task_payload()).unwrap();
        let task = build_task(&draft).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.effort_hours, 2.0);
    }

    #[test]
    fn test_strict_collects_all_missing_fields() {
        let draft = task_draft_from_value(&json!({"title": "T"})).unwrap();
        let errors = validate_task(&draft, ValidationMode::Strict).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"description"));
        assert!(fields.contains(&"priority"));
        assert!(fields.contains(&"effort_hours"));
        assert!(fields.contains(&"status"));
        assert!(fields.contains(&"assigned_to"));
    }

    #[test]
    fn test_partial_skips_absent_fields() {
        let draft = task_draft_from_value(&json!({"status": "done"})).unwrap();
        assert!(validate_task(&draft, ValidationMode::Partial).is_ok());
    }

    #[test]
    fn test_partial_still_checks_present_fields() {
        let draft = task_draft_from_value(&json!({"priority": "urgent"})).unwrap();
        let errors = validate_task(&draft, ValidationMode::Partial).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "priority");
        assert!(errors[0].reason.contains("urgent"));
    }

    #[test]
    fn test_enum_membership_is_case_sensitive() {
        let draft = task_draft_from_value(&json!({"category": "backend"})).unwrap();
        assert!(validate_task(&draft, ValidationMode::Partial).is_err());

        let draft = task_draft_from_value(&json!({"category": "Backend"})).unwrap();
        assert!(validate_task(&draft, ValidationMode::Partial).is_ok());
    }

    #[test]
    fn test_effort_hours_coerced_from_string() {
        let mut payload = full_task_payload();
        payload["effort_hours"] = json!("2.5");
        let draft = task_draft_from_value(&payload).unwrap();
        assert_eq!(draft.effort_hours, Some(2.5));
    }

    #[test]
    fn test_effort_hours_non_numeric_rejected_at_intake() {
        let errors = task_draft_from_value(&json!({"effort_hours": "lots"})).unwrap_err();
        assert_eq!(errors[0].field, "effort_hours");
    }

    #[test]
    fn test_negative_effort_rejected() {
        let draft = task_draft_from_value(&json!({"effort_hours": -1.0})).unwrap();
        assert!(validate_task(&draft, ValidationMode::Partial).is_err());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let mut payload = full_task_payload();
        payload["flavor"] = json!("vanilla");
        payload["id"] = json!(99);
        let draft = task_draft_from_value(&payload).unwrap();
        assert!(build_task(&draft).is_ok());
    }

    #[test]
    fn test_risk_fields_must_come_together() {
        let mut payload = full_task_payload();
        payload["risk_analysis"] = json!("might break");
        let draft = task_draft_from_value(&payload).unwrap();
        let errors = build_task(&draft).unwrap_err();
        assert_eq!(errors[0].field, "risk_mitigation");

        payload["risk_mitigation"] = json!("test it");
        let draft = task_draft_from_value(&payload).unwrap();
        assert!(build_task(&draft).is_ok());
    }

    #[test]
    fn test_story_points_boundaries() {
        for (points, ok) in [(0, false), (1, true), (8, true), (9, false)] {
            let draft = story_draft_from_value(&json!({"story_points": points})).unwrap();
            let result = validate_story(&draft, ValidationMode::Partial);
            assert_eq!(result.is_ok(), ok, "story_points={}", points);
        }
    }

    #[test]
    fn test_story_strict_create() {
        let draft = story_draft_from_value(&json!({
            "project": "Demo",
            "role": "As a user",
            "goal": "I want to register",
            "reason": "so that I can log in",
            "description": "Registration flow",
            "priority": "high",
            "story_points": 5,
            "effort_hours": 8
        }))
        .unwrap();

        let story = build_story(&draft).unwrap();
        assert_eq!(story.priority, Priority::High);
        assert_eq!(story.story_points, 5);
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut payload = full_task_payload();
        payload["title"] = json!("   ");
        let draft = task_draft_from_value(&payload).unwrap();
        let errors = build_task(&draft).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "title"));
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let errors = task_draft_from_value(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(errors[0].field, "payload");
    }
}
