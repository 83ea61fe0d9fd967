pub mod task;
pub mod token;
pub mod user;

pub use task::{CreateTaskRequest, NewTask, Task, TaskChanges, UpdateTaskRequest};
pub use token::{NewSessionToken, SessionToken, TokenPair};
pub use user::{Credentials, LoginRequest, NewUser, PublicUser, RegisterRequest, Registration, User};

use crate::error::AppError;

/// Unwraps a required request field. Absent and empty values are both treated as missing.
pub(crate) fn require(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::missing_field(field)),
    }
}
