//! Session lifecycle: registration, login, refresh, logout and the access check behind the
//! authorization gate.
//!
//! A user has at most one live session. Login supersedes every earlier session of the
//! user; refresh rotates the access token, the refresh token and the expiry of the same
//! record. Expiry is detected lazily: whichever operation first sees an expired record
//! deletes it and rejects the request.

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::sync::Arc;

use super::password::{hash_password, verify_password};
use super::token::{generate_pair, is_expired, is_well_formed, session_ttl};
use crate::error::AppError;
use crate::models::{
    LoginRequest, NewSessionToken, NewUser, PublicUser, RegisterRequest, SessionToken, TokenPair,
};
use crate::store::{TokenStore, UserStore};

#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    hash_cost: u32,
}

impl SessionManager {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            users,
            tokens,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt work factor used for new registrations.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Creates a user. Required fields are checked before storage is touched.
    pub async fn register(&self, request: RegisterRequest) -> Result<PublicUser, AppError> {
        let registration = request.validated()?;
        let password_hash = hash_password(&registration.password, self.hash_cost)?;

        let user = self
            .users
            .create(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
            })
            .await
            .map_err(|err| match err {
                AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
                other => other,
            })?;

        info!("Registered user {}", user.id);
        Ok(PublicUser::from(user))
    }

    /// Verifies credentials and issues a new session, superseding any earlier one.
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, AppError> {
        let credentials = request.validated()?;

        let user = self
            .users
            .find_by_email(&credentials.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

        if !verify_password(&credentials.password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Invalid password".into()));
        }

        let (access_token, refresh_token) = generate_pair();
        let session = self
            .tokens
            .supersede(NewSessionToken {
                access_token,
                refresh_token,
                expires_at: Utc::now() + session_ttl(),
                user_id: user.id,
            })
            .await?;

        info!("User {} logged in (session {})", user.id, session.id);
        Ok(TokenPair::from(&session))
    }

    /// Exchanges a live refresh token for a rotated pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let invalid = || AppError::Unauthorized("Invalid refresh token".into());
        if !is_well_formed(refresh_token) {
            return Err(invalid());
        }

        let session = self
            .tokens
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or_else(invalid)?;

        if is_expired(Utc::now(), session.expires_at) {
            self.tokens.delete_by_id(session.id).await?;
            debug!("Refresh with expired session {}; deleted", session.id);
            return Err(AppError::Unauthorized("Refresh token expired".into()));
        }

        let (access_token, refresh_token) = generate_pair();
        let rotated = self
            .tokens
            .rotate(
                session.id,
                &access_token,
                &refresh_token,
                Utc::now() + session_ttl(),
            )
            .await?
            // Deleted by a concurrent logout, login or sweep.
            .ok_or_else(invalid)?;

        info!("Rotated session {} for user {}", rotated.id, rotated.user_id);
        Ok(TokenPair::from(&rotated))
    }

    /// Revokes the session identified by its access token.
    pub async fn logout(&self, access_token: &str) -> Result<(), AppError> {
        let session = self.find_live_candidate(access_token).await?;
        self.tokens.delete_by_id(session.id).await?;
        info!("User {} logged out (session {})", session.user_id, session.id);
        Ok(())
    }

    /// Resolves an access token to its owner. Read-only unless the token has expired,
    /// in which case the record is deleted.
    pub async fn authorize(&self, access_token: &str) -> Result<i32, AppError> {
        let session = self.find_live_candidate(access_token).await?;

        if is_expired(Utc::now(), session.expires_at) {
            self.tokens.delete_by_id(session.id).await?;
            debug!("Access with expired session {}; deleted", session.id);
            return Err(AppError::Unauthorized("Token expired".into()));
        }

        Ok(session.user_id)
    }

    /// Deletes every session whose expiry has passed. Returns how many were removed.
    pub async fn sweep_expired(&self) -> Result<u64, AppError> {
        self.sweep_expired_at(Utc::now()).await
    }

    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let removed = self.tokens.delete_expired(now).await?;
        if removed > 0 {
            info!("Swept {} expired session(s)", removed);
        }
        Ok(removed)
    }

    async fn find_live_candidate(&self, access_token: &str) -> Result<SessionToken, AppError> {
        let invalid = || AppError::Unauthorized("Invalid token".into());
        if !is_well_formed(access_token) {
            return Err(invalid());
        }
        self.tokens
            .find_by_access_token(access_token)
            .await?
            .ok_or_else(invalid)
    }
}
