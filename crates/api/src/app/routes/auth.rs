//! Token endpoints: password login, refresh, and action-token completion.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use crate::app::dto::{LoginRequest, PasswordResetRequest, RefreshRequest, VerifyEmailRequest};
use crate::app::errors::{account_error_to_response, auth_error_to_response};
use crate::app::services::AppState;

/// POST /auth/login
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> axum::response::Response {
    match state
        .accounts
        .login_with_password(&req.user_id, &req.password, req.community_id, Utc::now())
        .await
    {
        Ok(pair) => (StatusCode::OK, Json(pair)).into_response(),
        Err(e) => auth_error_to_response(e),
    }
}

/// POST /auth/refresh
pub async fn refresh(State(state): State<AppState>, Json(req): Json<RefreshRequest>) -> axum::response::Response {
    match state.accounts.sessions().refresh(&req.refresh_token, Utc::now()) {
        Ok(pair) => (StatusCode::OK, Json(pair)).into_response(),
        Err(e) => auth_error_to_response(e),
    }
}

/// POST /auth/password-reset
pub async fn password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> axum::response::Response {
    match state
        .accounts
        .reset_password(&req.token, &req.new_password, Utc::now())
        .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => account_error_to_response(e),
    }
}

/// POST /auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> axum::response::Response {
    match state.accounts.verify_email(&req.token, Utc::now()).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => auth_error_to_response(e),
    }
}
