//! AI enrichment
//!
//! LLM-driven generation of Task fields, story decomposition into tasks,
//! and story generation from a free-form prompt. Everything the model
//! produces is untrusted draft data until the entity validator accepts it.

mod decomposer;
mod fields;
mod story;

pub use decomposer::StoryDecomposer;
pub use fields::{AuditResult, TaskEnricher};
pub use story::StoryGenerator;

use thiserror::Error;

use crate::llm::LlmError;
use crate::state::StateError;
use crate::validation::FieldViolation;

/// Errors from AI generation operations
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The input entity lacks a field the generator needs for context
    #[error("Field '{0}' is required for generation")]
    MissingField(&'static str),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Model returned no content")]
    EmptyResponse,

    /// The model's effort estimate was not a number
    #[error("Could not interpret effort estimate: '{0}'")]
    BadEstimate(String),

    /// The model's structured output did not match the expected shape
    #[error("Invalid generation output: {0}")]
    InvalidOutput(String),

    /// Generated entities failed validation; nothing was persisted
    #[error("Generated output failed validation: {0:?}")]
    Rejected(Vec<FieldViolation>),

    #[error("State error: {0}")]
    State(#[from] StateError),
}
