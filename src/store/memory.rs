//! In-process store.
//!
//! A single `RwLock` guards all three tables, so each trait call (including
//! `supersede`) is atomic with respect to every other call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{TaskStore, TokenStore, UserStore};
use crate::error::AppError;
use crate::models::{NewSessionToken, NewTask, NewUser, SessionToken, Task, TaskChanges, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    tokens: BTreeMap<i32, SessionToken>,
    tasks: BTreeMap<i32, Task>,
    last_user_id: i32,
    last_token_id: i32,
    last_task_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl Tables {
    fn insert_token(&mut self, token: NewSessionToken) -> Result<SessionToken, AppError> {
        if !self.users.contains_key(&token.user_id) {
            return Err(AppError::DatabaseError(format!(
                "token references unknown user {}",
                token.user_id
            )));
        }
        let clash = self.tokens.values().any(|t| {
            t.access_token == token.access_token || t.refresh_token == token.refresh_token
        });
        if clash {
            return Err(AppError::Conflict("Record already exists".into()));
        }

        let row = SessionToken {
            id: next_id(&mut self.last_token_id),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token.expires_at,
            user_id: token.user_id,
        };
        self.tokens.insert(row.id, row.clone());
        Ok(row)
    }

    fn remove_tokens_where<F>(&mut self, predicate: F) -> u64
    where
        F: Fn(&SessionToken) -> bool,
    {
        let before = self.tokens.len();
        self.tokens.retain(|_, t| !predicate(t));
        (before - self.tokens.len()) as u64
    }
}

/// Cloning a `MemoryStore` yields another handle onto the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Record already exists".into()));
        }
        let row = User {
            id: next_id(&mut tables.last_user_id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn find_by_access_token(&self, token: &str) -> Result<Option<SessionToken>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .values()
            .find(|t| t.access_token == token)
            .cloned())
    }

    async fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<SessionToken>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .values()
            .find(|t| t.refresh_token == token)
            .cloned())
    }

    async fn find_all_by_user(&self, user_id: i32) -> Result<Vec<SessionToken>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, token: NewSessionToken) -> Result<SessionToken, AppError> {
        self.tables.write().await.insert_token(token)
    }

    async fn delete_by_id(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.tables.write().await.tokens.remove(&id).is_some())
    }

    async fn delete_all_by_user(&self, user_id: i32) -> Result<u64, AppError> {
        Ok(self
            .tables
            .write()
            .await
            .remove_tokens_where(|t| t.user_id == user_id))
    }

    async fn supersede(&self, token: NewSessionToken) -> Result<SessionToken, AppError> {
        let mut tables = self.tables.write().await;
        let user_id = token.user_id;
        let previous: Vec<SessionToken> = tables
            .tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tables.remove_tokens_where(|t| t.user_id == user_id);

        match tables.insert_token(token) {
            Ok(row) => Ok(row),
            Err(err) => {
                // Roll back the delete.
                for t in previous {
                    tables.tokens.insert(t.id, t);
                }
                Err(err)
            }
        }
    }

    async fn rotate(
        &self,
        id: i32,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<SessionToken>, AppError> {
        let mut tables = self.tables.write().await;
        let clash = tables.tokens.values().any(|t| {
            t.id != id && (t.access_token == access_token || t.refresh_token == refresh_token)
        });
        if clash {
            return Err(AppError::Conflict("Record already exists".into()));
        }

        Ok(tables.tokens.get_mut(&id).map(|t| {
            t.access_token = access_token.to_string();
            t.refresh_token = refresh_token.to_string();
            t.expires_at = expires_at;
            t.clone()
        }))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        Ok(self
            .tables
            .write()
            .await
            .remove_tokens_where(|t| t.expires_at < now))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        let row = Task {
            id: next_id(&mut tables.last_task_id),
            title: task.title,
            completed: task.completed,
            user_id: task.user_id,
        };
        tables.tasks.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list(&self, owner_id: i32) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .filter(|t| t.user_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find(&self, owner_id: i32, id: i32) -> Result<Option<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .get(&id)
            .filter(|t| t.user_id == owner_id)
            .cloned())
    }

    async fn update(
        &self,
        owner_id: i32,
        id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .tasks
            .get_mut(&id)
            .filter(|t| t.user_id == owner_id)
            .map(|t| {
                changes.apply(t);
                t.clone()
            }))
    }

    async fn delete(&self, owner_id: i32, id: i32) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let owned = tables.tasks.get(&id).map_or(false, |t| t.user_id == owner_id);
        if owned {
            tables.tasks.remove(&id);
        }
        Ok(owned)
    }
}
