//! storyforge - AI-augmented project management service
//!
//! Tasks and UserStories with CRUD over a line-framed socket API, plus
//! LLM-assisted field generation and story decomposition. Everything the
//! model produces passes through the same entity validator as human input
//! before it can be persisted.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod enrich;
pub mod llm;
pub mod state;
pub mod validation;

pub use api::{ApiRequest, ApiResponse, Service, ServiceClient};
pub use config::Config;
pub use llm::LlmClient;
pub use state::StateManager;
