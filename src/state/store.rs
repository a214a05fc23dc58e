//! SQLite-backed store for Tasks and UserStories
//!
//! Owned exclusively by the StateManager actor. Ids are assigned by SQLite
//! on insert; `created_at` is written once at insert and never updated.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use tracing::debug;

use super::messages::StateError;
use crate::domain::{NewStory, NewTask, Task, UserStory};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL,
    priority        TEXT NOT NULL,
    effort_hours    REAL NOT NULL,
    status          TEXT NOT NULL,
    assigned_to     TEXT NOT NULL,
    category        TEXT,
    risk_analysis   TEXT,
    risk_mitigation TEXT,
    user_story_id   INTEGER,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_stories (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    project      TEXT NOT NULL,
    role         TEXT NOT NULL,
    goal         TEXT NOT NULL,
    reason       TEXT NOT NULL,
    description  TEXT NOT NULL,
    priority     TEXT NOT NULL,
    story_points INTEGER NOT NULL,
    effort_hours REAL NOT NULL,
    created_at   TEXT NOT NULL
);
";

/// Persistent store over a single SQLite connection
pub struct Store {
    conn: Connection,
}

fn parse_text<T>(idx: usize, s: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    s.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into()))
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let priority: String = row.get(3)?;
    let status: String = row.get(5)?;
    let category: Option<String> = row.get(7)?;
    let created_at: String = row.get(11)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        priority: parse_text(3, &priority)?,
        effort_hours: row.get(4)?,
        status: parse_text(5, &status)?,
        assigned_to: row.get(6)?,
        category: category.as_deref().map(|c| parse_text(7, c)).transpose()?,
        risk_analysis: row.get(8)?,
        risk_mitigation: row.get(9)?,
        user_story_id: row.get(10)?,
        created_at: parse_timestamp(11, &created_at)?,
    })
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<UserStory> {
    let priority: String = row.get(6)?;
    let created_at: String = row.get(9)?;

    Ok(UserStory {
        id: row.get(0)?,
        project: row.get(1)?,
        role: row.get(2)?,
        goal: row.get(3)?,
        reason: row.get(4)?,
        description: row.get(5)?,
        priority: parse_text(6, &priority)?,
        story_points: row.get(7)?,
        effort_hours: row.get(8)?,
        created_at: parse_timestamp(9, &created_at)?,
    })
}

const TASK_COLUMNS: &str = "id, title, description, priority, effort_hours, status, assigned_to, \
                            category, risk_analysis, risk_mitigation, user_story_id, created_at";

const STORY_COLUMNS: &str =
    "id, project, role, goal, reason, description, priority, story_points, effort_hours, created_at";

impl Store {
    /// Open (or create) the store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        debug!(path = %path.as_ref().display(), "Store::open: called");
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> Result<Self, StateError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // === Tasks ===

    pub fn create_task(&mut self, task: &NewTask) -> Result<Task, StateError> {
        debug!(title = %task.title, "create_task: called");
        let tx = self.conn.transaction()?;
        let created = insert_task(&tx, task)?;
        tx.commit()?;
        Ok(created)
    }

    /// Insert a batch of tasks; the whole batch lands or none of it does
    pub fn create_tasks(&mut self, tasks: &[NewTask]) -> Result<Vec<Task>, StateError> {
        debug!(count = tasks.len(), "create_tasks: called");
        let tx = self.conn.transaction()?;
        let mut created = Vec::with_capacity(tasks.len());
        for task in tasks {
            created.push(insert_task(&tx, task)?);
        }
        tx.commit()?;
        Ok(created)
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>, StateError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS))?;
        let mut rows = stmt.query_map(params![id], task_from_row)?;
        rows.next().transpose().map_err(Into::into)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, StateError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS))?;
        let rows = stmt.query_map([], task_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Replace every mutable field of the task at `id`; id and created_at
    /// are never touched
    pub fn update_task(&mut self, id: i64, task: &NewTask) -> Result<Task, StateError> {
        debug!(%id, "update_task: called");
        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, priority = ?3, effort_hours = ?4, \
             status = ?5, assigned_to = ?6, category = ?7, risk_analysis = ?8, \
             risk_mitigation = ?9, user_story_id = ?10 WHERE id = ?11",
            params![
                task.title,
                task.description,
                task.priority.as_str(),
                task.effort_hours,
                task.status.as_str(),
                task.assigned_to,
                task.category.map(|c| c.as_str()),
                task.risk_analysis,
                task.risk_mitigation,
                task.user_story_id,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StateError::NotFound(format!("Task {}", id)));
        }
        self.get_task(id)?
            .ok_or_else(|| StateError::NotFound(format!("Task {}", id)))
    }

    pub fn delete_task(&mut self, id: i64) -> Result<(), StateError> {
        debug!(%id, "delete_task: called");
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StateError::NotFound(format!("Task {}", id)));
        }
        Ok(())
    }

    // === UserStories ===

    pub fn create_story(&mut self, story: &NewStory) -> Result<UserStory, StateError> {
        debug!(project = %story.project, "create_story: called");
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO user_stories (project, role, goal, reason, description, priority, \
             story_points, effort_hours, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                story.project,
                story.role,
                story.goal,
                story.reason,
                story.description,
                story.priority.as_str(),
                story.story_points,
                story.effort_hours,
                created_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        Ok(UserStory {
            id,
            project: story.project.clone(),
            role: story.role.clone(),
            goal: story.goal.clone(),
            reason: story.reason.clone(),
            description: story.description.clone(),
            priority: story.priority,
            story_points: story.story_points,
            effort_hours: story.effort_hours,
            created_at,
        })
    }

    pub fn get_story(&self, id: i64) -> Result<Option<UserStory>, StateError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM user_stories WHERE id = ?1", STORY_COLUMNS))?;
        let mut rows = stmt.query_map(params![id], story_from_row)?;
        rows.next().transpose().map_err(Into::into)
    }

    pub fn list_stories(&self) -> Result<Vec<UserStory>, StateError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM user_stories ORDER BY id", STORY_COLUMNS))?;
        let rows = stmt.query_map([], story_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn update_story(&mut self, id: i64, story: &NewStory) -> Result<UserStory, StateError> {
        debug!(%id, "update_story: called");
        let changed = self.conn.execute(
            "UPDATE user_stories SET project = ?1, role = ?2, goal = ?3, reason = ?4, \
             description = ?5, priority = ?6, story_points = ?7, effort_hours = ?8 WHERE id = ?9",
            params![
                story.project,
                story.role,
                story.goal,
                story.reason,
                story.description,
                story.priority.as_str(),
                story.story_points,
                story.effort_hours,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StateError::NotFound(format!("UserStory {}", id)));
        }
        self.get_story(id)?
            .ok_or_else(|| StateError::NotFound(format!("UserStory {}", id)))
    }

    /// Delete a story and detach its tasks in the same transaction
    ///
    /// Tasks outlive the story they came from; their `user_story_id` is
    /// nulled so no dangling reference survives the delete.
    pub fn delete_story(&mut self, id: i64) -> Result<(), StateError> {
        debug!(%id, "delete_story: called");
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE tasks SET user_story_id = NULL WHERE user_story_id = ?1",
            params![id],
        )?;
        let changed = tx.execute("DELETE FROM user_stories WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StateError::NotFound(format!("UserStory {}", id)));
        }
        tx.commit()?;
        Ok(())
    }
}

fn insert_task(conn: &Connection, task: &NewTask) -> Result<Task, StateError> {
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO tasks (title, description, priority, effort_hours, status, assigned_to, \
         category, risk_analysis, risk_mitigation, user_story_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            task.title,
            task.description,
            task.priority.as_str(),
            task.effort_hours,
            task.status.as_str(),
            task.assigned_to,
            task.category.map(|c| c.as_str()),
            task.risk_analysis,
            task.risk_mitigation,
            task.user_story_id,
            created_at.to_rfc3339(),
        ],
    )?;
    let id = conn.last_insert_rowid();

    Ok(Task {
        id,
        title: task.title.clone(),
        description: task.description.clone(),
        priority: task.priority,
        effort_hours: task.effort_hours,
        status: task.status,
        assigned_to: task.assigned_to.clone(),
        category: task.category,
        risk_analysis: task.risk_analysis.clone(),
        risk_mitigation: task.risk_mitigation.clone(),
        user_story_id: task.user_story_id,
        created_at,
    })
}
