//! StateManager - actor that owns the Store
//!
//! Processes commands via channels for thread-safe access to persistent
//! state. The SQLite connection lives inside the actor task; everything
//! else holds a cloneable handle.

use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::Store;
use super::messages::{StateCommand, StateError, StateResponse};
use crate::domain::{NewStory, NewTask, Task, UserStory};

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Spawn a new StateManager actor over the store at `path`
    pub fn spawn(store_path: impl AsRef<Path>) -> Result<Self, StateError> {
        debug!(store_path = %store_path.as_ref().display(), "spawn: called");
        let store = Store::open(store_path.as_ref())?;
        Ok(Self::spawn_with_store(store))
    }

    /// Spawn the actor over an already-open store (tests use the in-memory
    /// store through this)
    pub fn spawn_with_store(store: Store) -> Self {
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(store, rx));
        info!("StateManager spawned");
        Self { tx }
    }

    async fn send<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand,
    ) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    // === Task operations ===

    pub async fn create_task(&self, task: NewTask) -> StateResponse<Task> {
        debug!(title = %task.title, "create_task: called");
        self.send(|reply| StateCommand::CreateTask { task, reply }).await
    }

    /// Persist a batch of tasks atomically
    pub async fn create_tasks(&self, tasks: Vec<NewTask>) -> StateResponse<Vec<Task>> {
        debug!(count = tasks.len(), "create_tasks: called");
        self.send(|reply| StateCommand::CreateTasks { tasks, reply }).await
    }

    pub async fn get_task(&self, id: i64) -> StateResponse<Option<Task>> {
        debug!(%id, "get_task: called");
        self.send(|reply| StateCommand::GetTask { id, reply }).await
    }

    pub async fn list_tasks(&self) -> StateResponse<Vec<Task>> {
        debug!("list_tasks: called");
        self.send(|reply| StateCommand::ListTasks { reply }).await
    }

    pub async fn update_task(&self, id: i64, task: NewTask) -> StateResponse<Task> {
        debug!(%id, "update_task: called");
        self.send(|reply| StateCommand::UpdateTask { id, task, reply }).await
    }

    pub async fn delete_task(&self, id: i64) -> StateResponse<()> {
        debug!(%id, "delete_task: called");
        self.send(|reply| StateCommand::DeleteTask { id, reply }).await
    }

    // === UserStory operations ===

    pub async fn create_story(&self, story: NewStory) -> StateResponse<UserStory> {
        debug!(project = %story.project, "create_story: called");
        self.send(|reply| StateCommand::CreateStory { story, reply }).await
    }

    pub async fn get_story(&self, id: i64) -> StateResponse<Option<UserStory>> {
        debug!(%id, "get_story: called");
        self.send(|reply| StateCommand::GetStory { id, reply }).await
    }

    pub async fn list_stories(&self) -> StateResponse<Vec<UserStory>> {
        debug!("list_stories: called");
        self.send(|reply| StateCommand::ListStories { reply }).await
    }

    pub async fn update_story(&self, id: i64, story: NewStory) -> StateResponse<UserStory> {
        debug!(%id, "update_story: called");
        self.send(|reply| StateCommand::UpdateStory { id, story, reply }).await
    }

    pub async fn delete_story(&self, id: i64) -> StateResponse<()> {
        debug!(%id, "delete_story: called");
        self.send(|reply| StateCommand::DeleteStory { id, reply }).await
    }

    /// Ask the actor to stop after draining queued commands
    pub async fn shutdown(&self) {
        debug!("shutdown: called");
        let _ = self.tx.send(StateCommand::Shutdown).await;
    }
}

/// The actor task: single owner of the Store, processes commands in order
async fn actor_loop(mut store: Store, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("actor_loop: started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::CreateTask { task, reply } => {
                let _ = reply.send(store.create_task(&task));
            }
            StateCommand::CreateTasks { tasks, reply } => {
                let _ = reply.send(store.create_tasks(&tasks));
            }
            StateCommand::GetTask { id, reply } => {
                let _ = reply.send(store.get_task(id));
            }
            StateCommand::ListTasks { reply } => {
                let _ = reply.send(store.list_tasks());
            }
            StateCommand::UpdateTask { id, task, reply } => {
                let _ = reply.send(store.update_task(id, &task));
            }
            StateCommand::DeleteTask { id, reply } => {
                let _ = reply.send(store.delete_task(id));
            }
            StateCommand::CreateStory { story, reply } => {
                let _ = reply.send(store.create_story(&story));
            }
            StateCommand::GetStory { id, reply } => {
                let _ = reply.send(store.get_story(id));
            }
            StateCommand::ListStories { reply } => {
                let _ = reply.send(store.list_stories());
            }
            StateCommand::UpdateStory { id, story, reply } => {
                let _ = reply.send(store.update_story(id, &story));
            }
            StateCommand::DeleteStory { id, reply } => {
                let _ = reply.send(store.delete_story(id));
            }
            StateCommand::Shutdown => {
                info!("actor_loop: shutdown requested");
                break;
            }
        }
    }

    debug!("actor_loop: stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, Status};

    fn in_memory_manager() -> StateManager {
        StateManager::spawn_with_store(Store::open_in_memory().unwrap())
    }

    fn sample_task() -> NewTask {
        NewTask {
            title: "Write docs".to_string(),
            description: "User guide".to_string(),
            priority: Priority::Low,
            effort_hours: 1.5,
            status: Status::Pending,
            assigned_to: "Ana".to_string(),
            category: None,
            risk_analysis: None,
            risk_mitigation: None,
            user_story_id: None,
        }
    }

    #[tokio::test]
    async fn test_task_crud_through_actor() {
        let state = in_memory_manager();

        let created = state.create_task(sample_task()).await.unwrap();
        let fetched = state.get_task(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let mut patch = sample_task();
        patch.status = Status::InProgress;
        let updated = state.update_task(created.id, patch).await.unwrap();
        assert_eq!(updated.status, Status::InProgress);

        state.delete_task(created.id).await.unwrap();
        assert!(state.get_task(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_missing_task_returns_none() {
        let state = in_memory_manager();
        assert!(state.get_task(12345).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_stops_actor() {
        let state = in_memory_manager();
        state.shutdown().await;
        // Commands after shutdown fail with a channel error once the
        // receiver is gone.
        tokio::task::yield_now().await;
        let result = state.list_tasks().await;
        assert!(matches!(result, Err(StateError::ChannelError) | Ok(_)));
    }
}
