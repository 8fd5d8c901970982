//! Account registration and session handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use platform_core::error::AppError;
use validator::Validate;

use crate::dtos::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::middleware::AuthUser;
use crate::models::User;
use crate::services::password;
use crate::startup::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if state
        .db
        .find_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "An account with this email already exists"
        )));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let user = User::new(
        payload.email,
        password_hash,
        payload.first_name,
        payload.last_name,
    );
    state.db.insert_user(&user).await?;

    tracing::info!(user_id = %user.id, "User registered");

    let token = state
        .tokens
        .issue_session_token(&user.id, &user.email)?;
    let response = AuthResponse::new(
        user.into_identity(),
        token,
        state.tokens.session_expiry_seconds(),
    );

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // One failure path for every cause, so a caller cannot probe which
    // emails have accounts.
    let invalid_credentials =
        || AppError::Unauthorized(anyhow::anyhow!("invalid email or password"));

    let user = state
        .db
        .find_user_by_email(&payload.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let stored_hash = user.password_hash.as_deref().ok_or_else(invalid_credentials)?;
    if !password::verify_password(&payload.password, stored_hash)? {
        return Err(invalid_credentials());
    }

    if !user.is_active {
        tracing::warn!(user_id = %user.id, "Login attempt on deactivated account");
        return Err(invalid_credentials());
    }

    state.db.record_login(&user.id).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    let token = state
        .tokens
        .issue_session_token(&user.id, &user.email)?;
    let response = AuthResponse::new(
        user.into_identity(),
        token,
        state.tokens.session_expiry_seconds(),
    );

    Ok(Json(response))
}

/// The caller's own identity, as resolved by the auth middleware.
pub async fn me(AuthUser(identity): AuthUser) -> impl IntoResponse {
    Json(identity)
}
