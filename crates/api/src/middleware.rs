//! Auth gates as axum middleware.
//!
//! `require_auth` must wrap every scoped guard: guards read the
//! [`RequestContext`] it inserts and fail closed when it is absent.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use guildhall_auth::{AuthError, CommunityRole, GroupRole, PlatformRole};
use guildhall_core::{CommunityId, GroupId};

use crate::app::errors::{auth_error_to_response, json_error};
use crate::app::services::AppState;
use crate::context::RequestContext;

/// State for a role guard: shared app state plus the role it demands.
#[derive(Debug, Clone)]
pub struct RoleGuard<R> {
    pub state: AppState,
    pub required: R,
}

impl<R> RoleGuard<R> {
    pub fn new(state: AppState, required: R) -> Self {
        Self { state, required }
    }
}

/// Validate the bearer access token and attach a [`RequestContext`].
pub async fn require_auth(State(state): State<AppState>, mut req: Request<Body>, next: Next) -> Response {
    let result = {
        let header = match req.headers().get(header::AUTHORIZATION).map(|v| v.to_str()) {
            None => None,
            Some(Ok(value)) => Some(value),
            Some(Err(_)) => return auth_error_to_response(AuthError::MalformedToken),
        };
        state.gate.authenticate(header, Utc::now())
    };

    match result {
        Ok(auth) => {
            req.extensions_mut().insert(RequestContext::new(auth));
            next.run(req).await
        }
        Err(err) => auth_error_to_response(err),
    }
}

pub async fn require_platform_role(
    State(guard): State<RoleGuard<PlatformRole>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(ctx) = req.extensions().get::<RequestContext>() else {
        return auth_error_to_response(AuthError::MissingCredential);
    };

    match guard.state.gate.require_role(ctx.auth(), guard.required) {
        Ok(()) => next.run(req).await,
        Err(err) => auth_error_to_response(err),
    }
}

pub async fn require_community_role(
    State(guard): State<RoleGuard<CommunityRole>>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(ctx) = req.extensions().get::<RequestContext>().cloned() else {
        return auth_error_to_response(AuthError::MissingCredential);
    };
    let community_id = match scope_param(&params, "community_id").map(CommunityId::parse) {
        Some(Ok(id)) => id,
        Some(Err(e)) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
        None => return missing_param("community_id"),
    };

    match guard
        .state
        .gate
        .require_community_role(ctx.auth(), &community_id, guard.required)
        .await
    {
        Ok(auth) => {
            req.extensions_mut().insert(RequestContext::new(auth));
            next.run(req).await
        }
        Err(err) => auth_error_to_response(err),
    }
}

pub async fn require_group_role(
    State(guard): State<RoleGuard<GroupRole>>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(ctx) = req.extensions().get::<RequestContext>().cloned() else {
        return auth_error_to_response(AuthError::MissingCredential);
    };
    let group_id = match scope_param(&params, "group_id").map(GroupId::parse) {
        Some(Ok(id)) => id,
        Some(Err(e)) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
        None => return missing_param("group_id"),
    };

    match guard
        .state
        .gate
        .require_group_role(ctx.auth(), &group_id, guard.required)
        .await
    {
        Ok(auth) => {
            req.extensions_mut().insert(RequestContext::new(auth));
            next.run(req).await
        }
        Err(err) => auth_error_to_response(err),
    }
}

fn scope_param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

fn missing_param(name: &'static str) -> Response {
    tracing::error!(param = name, "scope guard mounted on a route without its path parameter");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
}
