use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::require;
use crate::error::AppError;

/// A user row as stored. Never serialized; see [`PublicUser`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// The outward projection of a user. The password hash is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Insert payload for the credential store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Body of `POST /auth/register`.
///
/// Fields are optional at the deserialization layer so that a missing field produces a
/// validation error naming it rather than a generic JSON error.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    pub name: Option<String>,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A registration whose required fields are all present and well formed.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validated(self) -> Result<Registration, AppError> {
        let name = require(self.name.clone(), "name")?;
        let email = require(self.email.clone(), "email")?;
        let password = require(self.password.clone(), "password")?;
        self.validate()?;
        Ok(Registration {
            name,
            email,
            password,
        })
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validated(self) -> Result<Credentials, AppError> {
        Ok(Credentials {
            email: require(self.email, "email")?,
            password: require(self.password, "password")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: Option<&str>, email: Option<&str>, password: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            name: name.map(String::from),
            email: email.map(String::from),
            password: password.map(String::from),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::ValidationError(msg) => msg,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_register_request_validation() {
        let ok = register(Some("Ana"), Some("ana@x.com"), Some("pw123"))
            .validated()
            .unwrap();
        assert_eq!(ok.name, "Ana");
        assert_eq!(ok.email, "ana@x.com");

        let err = register(None, Some("ana@x.com"), Some("pw123")).validated().unwrap_err();
        assert_eq!(message(err), "name is required");

        let err = register(Some("Ana"), Some(""), Some("pw123")).validated().unwrap_err();
        assert_eq!(message(err), "email is required");

        let err = register(Some("Ana"), Some("ana@x.com"), None).validated().unwrap_err();
        assert_eq!(message(err), "password is required");

        let err = register(Some("Ana"), Some("not-an-email"), Some("pw123"))
            .validated()
            .unwrap_err();
        assert!(message(err).starts_with("email"));
    }

    #[test]
    fn test_login_request_validation() {
        let creds = LoginRequest {
            email: Some("ana@x.com".into()),
            password: Some("pw123".into()),
        }
        .validated()
        .unwrap();
        assert_eq!(creds.email, "ana@x.com");

        let err = LoginRequest {
            email: Some("ana@x.com".into()),
            password: None,
        }
        .validated()
        .unwrap_err();
        assert_eq!(message(err), "password is required");
    }

    #[test]
    fn test_public_user_drops_hash() {
        let user = User {
            id: 7,
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password_hash: "$2b$04$secret".into(),
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert_eq!(json, serde_json::json!({"id": 7, "name": "Ana", "email": "ana@x.com"}));
    }
}
