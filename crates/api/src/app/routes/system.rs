use axum::{Extension, Json, http::StatusCode};

use crate::app::dto::MeResponse;
use crate::context::RequestContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /me - the authenticated identity as the token asserts it.
pub async fn me(Extension(ctx): Extension<RequestContext>) -> Json<MeResponse> {
    Json(MeResponse::from(&ctx))
}
