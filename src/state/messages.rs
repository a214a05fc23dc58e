//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{NewStory, NewTask, Task, UserStory};

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Channel error")]
    ChannelError,
}

impl From<rusqlite::Error> for StateError {
    fn from(e: rusqlite::Error) -> Self {
        StateError::StoreError(e.to_string())
    }
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    // Task operations
    CreateTask {
        task: NewTask,
        reply: oneshot::Sender<StateResponse<Task>>,
    },
    /// Batch insert in one transaction; all rows land or none do
    CreateTasks {
        tasks: Vec<NewTask>,
        reply: oneshot::Sender<StateResponse<Vec<Task>>>,
    },
    GetTask {
        id: i64,
        reply: oneshot::Sender<StateResponse<Option<Task>>>,
    },
    ListTasks {
        reply: oneshot::Sender<StateResponse<Vec<Task>>>,
    },
    UpdateTask {
        id: i64,
        task: NewTask,
        reply: oneshot::Sender<StateResponse<Task>>,
    },
    DeleteTask {
        id: i64,
        reply: oneshot::Sender<StateResponse<()>>,
    },

    // UserStory operations
    CreateStory {
        story: NewStory,
        reply: oneshot::Sender<StateResponse<UserStory>>,
    },
    GetStory {
        id: i64,
        reply: oneshot::Sender<StateResponse<Option<UserStory>>>,
    },
    ListStories {
        reply: oneshot::Sender<StateResponse<Vec<UserStory>>>,
    },
    UpdateStory {
        id: i64,
        story: NewStory,
        reply: oneshot::Sender<StateResponse<UserStory>>,
    },
    /// Deletes the story and detaches its tasks in the same transaction
    DeleteStory {
        id: i64,
        reply: oneshot::Sender<StateResponse<()>>,
    },

    // Shutdown
    Shutdown,
}
