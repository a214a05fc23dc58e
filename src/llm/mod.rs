//! LLM client module
//!
//! Completion requests against an OpenAI-compatible endpoint, with
//! per-request sampling profiles keyed on generation intent.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod intent;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use intent::{GenerationProfile, Intent};
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, ResponseSchema, Role, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Only OpenAI-compatible endpoints are supported; self-hosted gateways work
/// through `base_url`.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIClient::from_config(config)?)),
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: openai",
                other
            )))
        }
    }
}
