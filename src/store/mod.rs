//! Persistence interfaces.
//!
//! The session manager, the authorization gate and the task handlers only ever talk to
//! these traits; the concrete store is chosen once at startup and handed down explicitly.
//! Two implementations exist: [`PgStore`] backed by `sqlx::PgPool`, and [`MemoryStore`]
//! which keeps everything in process (used by the test suite and when no
//! `DATABASE_URL` is configured).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{NewSessionToken, NewTask, NewUser, SessionToken, Task, TaskChanges, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Credential store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    /// Fails with [`AppError::Conflict`] when the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
}

/// Session-token store.
///
/// Access tokens and refresh tokens are looked up through separate methods and must
/// never be matched against each other's column.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn find_by_access_token(&self, token: &str) -> Result<Option<SessionToken>, AppError>;

    async fn find_by_refresh_token(&self, token: &str)
        -> Result<Option<SessionToken>, AppError>;

    async fn find_all_by_user(&self, user_id: i32) -> Result<Vec<SessionToken>, AppError>;

    async fn create(&self, token: NewSessionToken) -> Result<SessionToken, AppError>;

    /// Returns whether a row was removed.
    async fn delete_by_id(&self, id: i32) -> Result<bool, AppError>;

    /// Returns the number of rows removed.
    async fn delete_all_by_user(&self, user_id: i32) -> Result<u64, AppError>;

    /// Atomically deletes every token of `token.user_id` and inserts `token`.
    async fn supersede(&self, token: NewSessionToken) -> Result<SessionToken, AppError>;

    /// Replaces both token values and the expiry of an existing record, keeping its id.
    /// Returns `None` if the record no longer exists.
    async fn rotate(
        &self,
        id: i32,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<SessionToken>, AppError>;

    /// Deletes every token whose expiry is strictly before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

/// Task repository. Every call is scoped by the owner's id.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: NewTask) -> Result<Task, AppError>;

    /// Tasks of `owner_id`, ordered by id.
    async fn list(&self, owner_id: i32) -> Result<Vec<Task>, AppError>;

    async fn find(&self, owner_id: i32, id: i32) -> Result<Option<Task>, AppError>;

    /// Returns `None` when no task with this id belongs to `owner_id`.
    async fn update(
        &self,
        owner_id: i32,
        id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, AppError>;

    /// Returns whether a task was removed.
    async fn delete(&self, owner_id: i32, id: i32) -> Result<bool, AppError>;
}
