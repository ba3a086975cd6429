// ============================
// crates/taskvault-lib/src/handlers/auth.rs
// ============================
//! Account endpoints: register, login, current user.
//!
//! Identity on this route group is resolved through the bearer-token
//! strategy.
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::auth::token;
use crate::error::AppError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use crate::AppState;

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    tracing::info!(email = %body.email, "registration attempt");

    let user = state
        .users
        .create(&body.email, &body.username, &body.password)
        .await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let Some(user) = state
        .users
        .authenticate(&body.email, &body.password)
        .await?
    else {
        // Uniform response for unknown email and wrong password.
        tracing::warn!(email = %body.email, "failed login attempt");
        return Err(AppError::Unauthorized(
            "Incorrect email or password".to_string(),
        ));
    };

    let access_token = token::issue_access_token(&user.id, &state.settings)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
        user_id: user.id,
        username: user.username,
    }))
}

/// `GET /auth/me`
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = state.bearer.resolve(&headers).await?;

    let user = state
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}
