use axum::http::{HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use serde_json::json;

use guildhall_auth::{AccountError, AuthError, AuthErrorClass, PasswordError};

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err.class() {
        AuthErrorClass::Unauthenticated => {
            let mut res = json_error(StatusCode::UNAUTHORIZED, err.code(), err.to_string());
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            res
        }
        AuthErrorClass::Forbidden => json_error(StatusCode::FORBIDDEN, err.code(), err.to_string()),
        AuthErrorClass::Unavailable => {
            let mut res = json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                err.code(),
                "credential store unavailable, retry later",
            );
            res.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            res
        }
        AuthErrorClass::Internal => {
            tracing::error!(error = %err, "internal auth failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, err.code(), "internal error")
        }
    }
}

pub fn account_error_to_response(err: AccountError) -> axum::response::Response {
    match err {
        AccountError::Auth(e) => auth_error_to_response(e),
        AccountError::Password(PasswordError::TooWeak(reason)) => {
            json_error(StatusCode::BAD_REQUEST, "weak_password", format!("password {reason}"))
        }
        AccountError::Password(e) => {
            tracing::error!(error = %e, "password processing failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
