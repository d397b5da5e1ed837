//! Account and session handlers.

use axum::{Json, extract::Path, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::{RequireAuth, clear_current_user, set_current_user};
use crate::models::session::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    let user = auth.register(&body.name, &body.email, &body.password).await?;

    set_current_user(&session, &CurrentUser::from_user(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&body.email, &body.password).await?;

    set_current_user(&session, &CurrentUser::from_user(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

/// `POST /auth/logout`
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(json!({ "success": true, "message": "Logged out" })))
}

/// `GET /auth/me`
pub async fn me(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account no longer exists".to_owned()))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

/// `PUT /auth/me/update`
pub async fn update_me(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    let user = auth
        .update_profile(current.id, &body.name, &body.email)
        .await?;

    // Keep the session copy in sync with the new name/email.
    set_current_user(&session, &CurrentUser::from_user(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

/// `PUT /auth/password/update`
pub async fn update_password(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    auth.update_password(current.id, &body.old_password, &body.new_password)
        .await?;

    Ok(Json(json!({ "success": true, "message": "Password updated" })))
}

/// `POST /auth/password/forgot`
///
/// Responds identically whether or not the account exists. The issued token
/// reaches the operator through the server log; mail delivery is an external
/// collaborator.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());

    if let Some(token) = auth.forgot_password(&body.email).await? {
        tracing::info!(email = %body.email, token, "password reset token issued");
    }

    Ok(Json(json!({
        "success": true,
        "message": "If that account exists, a reset token has been issued"
    })))
}

/// `PUT /auth/password/reset/{token}`
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool());
    let user = auth.reset_password(&token, &body.password).await?;

    // Resetting the password logs the account in, like a fresh login.
    set_current_user(&session, &CurrentUser::from_user(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(json!({ "success": true, "user": user })))
}
