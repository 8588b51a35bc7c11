use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use guildhall_auth::{CommunityRole, GroupRole, PlatformRole};

use crate::app::services::AppState;
use crate::middleware::{self, RoleGuard};

pub mod auth;
pub mod scoped;
pub mod system;

/// Public token endpoints (no bearer required).
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/password-reset", post(auth::password_reset))
        .route("/auth/verify-email", post(auth::verify_email))
}

/// Routes behind `require_auth`, with per-route role guards inside it.
pub fn protected_router(state: &AppState) -> Router<AppState> {
    let platform_admin = Router::new()
        .route("/platform/admin", get(scoped::platform_admin))
        .route_layer(from_fn_with_state(
            RoleGuard::new(state.clone(), PlatformRole::Admin),
            middleware::require_platform_role,
        ));

    let community_admin = Router::new()
        .route("/communities/:community_id/admin", get(scoped::community_admin))
        .route_layer(from_fn_with_state(
            RoleGuard::new(state.clone(), CommunityRole::Admin),
            middleware::require_community_role,
        ));

    let group_leader = Router::new()
        .route("/groups/:group_id/leader", get(scoped::group_leader))
        .route_layer(from_fn_with_state(
            RoleGuard::new(state.clone(), GroupRole::Leader),
            middleware::require_group_role,
        ));

    Router::new()
        .route("/me", get(system::me))
        .merge(platform_admin)
        .merge(community_admin)
        .merge(group_leader)
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth))
}
