use crate::{
    auth::{presented_token, SessionManager},
    error::AppError,
    models::{LoginRequest, RegisterRequest},
};
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};

/// Register a new user
///
/// Creates a new user account and returns its public fields. No session is issued.
#[post("/register")]
pub async fn register(
    sessions: web::Data<SessionManager>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let user = sessions.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Login user
///
/// Verifies credentials and returns a fresh access/refresh pair. Any session the user
/// held before is revoked.
#[post("/login")]
pub async fn login(
    sessions: web::Data<SessionManager>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let pair = sessions.login(login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(pair))
}

/// Refresh session
///
/// Takes the refresh token from the `Authorization` header and returns a rotated pair.
#[post("/refresh")]
pub async fn refresh(
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let refresh_token = presented_token(req.headers())
        .ok_or_else(|| AppError::BadRequest("Refresh token is required".into()))?;
    let pair = sessions.refresh(refresh_token).await?;
    Ok(HttpResponse::Ok().json(pair))
}

/// Logout
///
/// Revokes the session whose access token is in the `Authorization` header.
#[post("/logout")]
pub async fn logout(
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let access_token = presented_token(req.headers())
        .ok_or_else(|| AppError::BadRequest("Token is required".into()))?;
    sessions.logout(access_token).await?;
    Ok(HttpResponse::NoContent().finish())
}
