//! Sample endpoints behind each gate kind.

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::app::dto::ScopeAccessResponse;
use crate::app::errors;
use crate::context::RequestContext;

/// GET /platform/admin - platform admins and super-admins.
pub async fn platform_admin(Extension(ctx): Extension<RequestContext>) -> axum::response::Response {
    Json(json!({
        "user_id": ctx.user_id(),
        "platform_role": ctx.platform_role(),
    }))
    .into_response()
}

/// GET /communities/:community_id/admin - admins of that community only.
pub async fn community_admin(Extension(ctx): Extension<RequestContext>) -> axum::response::Response {
    scope_access(&ctx)
}

/// GET /groups/:group_id/leader - leaders of that group only.
pub async fn group_leader(Extension(ctx): Extension<RequestContext>) -> axum::response::Response {
    scope_access(&ctx)
}

fn scope_access(ctx: &RequestContext) -> axum::response::Response {
    match ScopeAccessResponse::from_context(ctx) {
        Some(body) => Json(body).into_response(),
        None => {
            tracing::error!(user_id = %ctx.user_id(), "scoped handler reached without a resolved membership");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}
