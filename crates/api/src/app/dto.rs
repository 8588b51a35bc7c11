use serde::{Deserialize, Serialize};

use guildhall_auth::PlatformRole;
use guildhall_core::{CommunityId, UserId};

use crate::context::RequestContext;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: UserId,
    pub password: String,
    #[serde(default)]
    pub community_id: Option<CommunityId>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: UserId,
    pub platform_role: PlatformRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<CommunityId>,
}

impl From<&RequestContext> for MeResponse {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            user_id: ctx.user_id().clone(),
            platform_role: ctx.platform_role(),
            community_id: ctx.community_id().cloned(),
        }
    }
}

/// Body returned by scope-gated endpoints: who passed, where, and as what.
#[derive(Debug, Serialize)]
pub struct ScopeAccessResponse {
    pub user_id: UserId,
    pub scope: String,
    pub role: &'static str,
}

impl ScopeAccessResponse {
    pub fn from_context(ctx: &RequestContext) -> Option<Self> {
        let membership = ctx.membership()?;
        Some(Self {
            user_id: ctx.user_id().clone(),
            scope: membership.scope.to_string(),
            role: membership.role.as_str(),
        })
    }
}
