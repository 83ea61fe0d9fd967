use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::require;
use crate::error::AppError;

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier assigned by the store, starting at 1.
    pub id: i32,
    /// Non-empty title.
    pub title: String,
    pub completed: bool,
    /// Owner of the task. Set on creation and never changed afterwards.
    pub user_id: i32,
}

/// Body of `POST /task`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Required and non-empty.
    pub title: Option<String>,
    /// Defaults to `false`.
    pub completed: Option<bool>,
}

/// Insert payload for the task store. The owner always comes from the authenticated
/// request, never from the body.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub completed: bool,
    pub user_id: i32,
}

impl CreateTaskRequest {
    pub fn into_new_task(self, owner_id: i32) -> Result<NewTask, AppError> {
        Ok(NewTask {
            title: require(self.title, "title")?,
            completed: self.completed.unwrap_or(false),
            user_id: owner_id,
        })
    }
}

/// Body of `PUT /task/{id}`. Both fields are optional.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// The fields an update may touch. `None` leaves the stored value as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl UpdateTaskRequest {
    /// An empty title counts as "not supplied"; `completed: false` is a real change.
    pub fn into_changes(self) -> TaskChanges {
        TaskChanges {
            title: self.title.filter(|title| !title.is_empty()),
            completed: self.completed,
        }
    }
}

impl TaskChanges {
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}
