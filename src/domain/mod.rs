//! Domain entities for storyforge
//!
//! Validated entities (`Task`, `UserStory`) and the untrusted draft forms
//! (`TaskDraft`, `StoryDraft`) that payloads and AI output live in until
//! they pass the entity validator.

mod story;
mod task;

pub use story::{NewStory, StoryDraft, UserStory};
pub use task::{Category, NewTask, Priority, Status, Task, TaskDraft};
