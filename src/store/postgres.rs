//! PostgreSQL store. The schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{TaskStore, TokenStore, UserStore};
use crate::error::AppError;
use crate::models::{NewSessionToken, NewTask, NewUser, SessionToken, Task, TaskChanges, User};

const TOKEN_COLUMNS: &str = "id, access_token, refresh_token, expires_at, user_id";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool and brings the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to run migrations: {}", e)))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3)
             RETURNING id, name, email, password_hash",
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn find_by_access_token(&self, token: &str) -> Result<Option<SessionToken>, AppError> {
        let sql = format!("SELECT {} FROM session_tokens WHERE access_token = $1", TOKEN_COLUMNS);
        let row = sqlx::query_as::<_, SessionToken>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<SessionToken>, AppError> {
        let sql = format!("SELECT {} FROM session_tokens WHERE refresh_token = $1", TOKEN_COLUMNS);
        let row = sqlx::query_as::<_, SessionToken>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_all_by_user(&self, user_id: i32) -> Result<Vec<SessionToken>, AppError> {
        let sql = format!(
            "SELECT {} FROM session_tokens WHERE user_id = $1 ORDER BY id",
            TOKEN_COLUMNS
        );
        let rows = sqlx::query_as::<_, SessionToken>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn create(&self, token: NewSessionToken) -> Result<SessionToken, AppError> {
        let sql = format!(
            "INSERT INTO session_tokens (access_token, refresh_token, expires_at, user_id)
             VALUES ($1, $2, $3, $4) RETURNING {}",
            TOKEN_COLUMNS
        );
        let row = sqlx::query_as::<_, SessionToken>(&sql)
            .bind(token.access_token)
            .bind(token.refresh_token)
            .bind(token.expires_at)
            .bind(token.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_by_id(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM session_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_by_user(&self, user_id: i32) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM session_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn supersede(&self, token: NewSessionToken) -> Result<SessionToken, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM session_tokens WHERE user_id = $1")
            .bind(token.user_id)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "INSERT INTO session_tokens (access_token, refresh_token, expires_at, user_id)
             VALUES ($1, $2, $3, $4) RETURNING {}",
            TOKEN_COLUMNS
        );
        let row = sqlx::query_as::<_, SessionToken>(&sql)
            .bind(token.access_token)
            .bind(token.refresh_token)
            .bind(token.expires_at)
            .bind(token.user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn rotate(
        &self,
        id: i32,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<SessionToken>, AppError> {
        let sql = format!(
            "UPDATE session_tokens SET access_token = $1, refresh_token = $2, expires_at = $3
             WHERE id = $4 RETURNING {}",
            TOKEN_COLUMNS
        );
        let row = sqlx::query_as::<_, SessionToken>(&sql)
            .bind(access_token)
            .bind(refresh_token)
            .bind(expires_at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM session_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let row = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (title, completed, user_id) VALUES ($1, $2, $3)
             RETURNING id, title, completed, user_id",
        )
        .bind(task.title)
        .bind(task.completed)
        .bind(task.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self, owner_id: i32) -> Result<Vec<Task>, AppError> {
        let rows = sqlx::query_as::<_, Task>(
            "SELECT id, title, completed, user_id FROM tasks WHERE user_id = $1 ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find(&self, owner_id: i32, id: i32) -> Result<Option<Task>, AppError> {
        let row = sqlx::query_as::<_, Task>(
            "SELECT id, title, completed, user_id FROM tasks WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        owner_id: i32,
        id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, AppError> {
        let row = sqlx::query_as::<_, Task>(
            "UPDATE tasks
             SET title = COALESCE($1, title), completed = COALESCE($2, completed)
             WHERE id = $3 AND user_id = $4
             RETURNING id, title, completed, user_id",
        )
        .bind(changes.title)
        .bind(changes.completed)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, owner_id: i32, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
