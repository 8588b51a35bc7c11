//! Authorization gate: the single enforcement point for protected operations.
//!
//! One authentication step produces an [`AuthContext`]; scope checks are
//! independent predicates over that context. A scope check cannot run
//! without a context, and a context only comes out of [`AuthGate::authenticate`].

use std::sync::Arc;

use chrono::{DateTime, Utc};

use guildhall_core::{CommunityId, GroupId, UserId};

use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use crate::resolver::ScopeResolver;
use crate::roles::{CommunityRole, GroupRole, PlatformRole, Scope, ScopeRole};
use crate::store::{CredentialStore, ScopeMembership};
use crate::validator::TokenValidator;

/// Request-scoped identity established by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    user_id: UserId,
    platform_role: PlatformRole,
    community_id: Option<CommunityId>,
    membership: Option<ScopeMembership>,
}

impl AuthContext {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn platform_role(&self) -> PlatformRole {
        self.platform_role
    }

    /// Community the session was opened in (from the token).
    pub fn community_id(&self) -> Option<&CommunityId> {
        self.community_id.as_ref()
    }

    /// Membership resolved by the most recent scope check, if any.
    pub fn membership(&self) -> Option<&ScopeMembership> {
        self.membership.as_ref()
    }

    pub fn scope_role(&self) -> Option<ScopeRole> {
        self.membership.as_ref().map(|m| m.role)
    }

    fn with_membership(&self, membership: ScopeMembership) -> Self {
        Self {
            membership: Some(membership),
            ..self.clone()
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let raw = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(AuthError::MissingCredential)?;

    if raw.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingCredential);
    }

    let (scheme, token) = raw
        .split_once(|c: char| c.is_ascii_whitespace())
        .ok_or(AuthError::MalformedToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

pub struct AuthGate<S: ?Sized> {
    validator: TokenValidator,
    resolver: ScopeResolver<S>,
}

impl<S: ?Sized> Clone for AuthGate<S> {
    fn clone(&self) -> Self {
        Self {
            validator: self.validator.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl<S: ?Sized> core::fmt::Debug for AuthGate<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthGate")
            .field("validator", &self.validator)
            .field("resolver", &self.resolver)
            .finish()
    }
}

impl<S> AuthGate<S>
where
    S: CredentialStore + ?Sized,
{
    pub fn new(validator: TokenValidator, resolver: ScopeResolver<S>) -> Self {
        Self { validator, resolver }
    }

    pub fn from_config(config: &AuthConfig, store: Arc<S>) -> Result<Self, ConfigError> {
        Ok(Self::new(
            TokenValidator::new(config)?,
            ScopeResolver::new(store, config.store_timeout()),
        ))
    }

    /// Bearer header → validated access token → context.
    /// Never touches the credential store.
    pub fn authenticate(&self, authorization: Option<&str>, now: DateTime<Utc>) -> Result<AuthContext, AuthError> {
        let token = parse_bearer(authorization)?;
        let claims = self.validator.validate_access(token, now)?;

        Ok(AuthContext {
            user_id: claims.sub,
            platform_role: claims.role,
            community_id: claims.cid,
            membership: None,
        })
    }

    /// `requireRole(r)`: exact platform role or super-admin.
    pub fn require_role(&self, ctx: &AuthContext, required: PlatformRole) -> Result<(), AuthError> {
        if ctx.platform_role.permits(required) {
            tracing::debug!(user_id = %ctx.user_id, %required, "platform role check passed");
            Ok(())
        } else {
            tracing::info!(
                user_id = %ctx.user_id,
                held = %ctx.platform_role,
                %required,
                "platform role check denied"
            );
            Err(AuthError::InsufficientRole)
        }
    }

    /// `requireCommunityRole(r)`: membership in `community_id` with role `r`
    /// or community admin. Admin rights never cross into other communities.
    pub async fn require_community_role(
        &self,
        ctx: &AuthContext,
        community_id: &CommunityId,
        required: CommunityRole,
    ) -> Result<AuthContext, AuthError> {
        let membership = self
            .resolver
            .resolve_community_role(community_id, &ctx.user_id)
            .await
            .inspect_err(|e| deny(ctx, &Scope::Community(community_id.clone()), required.as_str(), e))?;

        let held = membership.role.as_community().ok_or_else(|| {
            AuthError::StoreUnavailable(format!("non-community role for {}", membership.scope))
        })?;

        if !held.permits(required) {
            let err = AuthError::InsufficientRole;
            deny(ctx, &membership.scope, required.as_str(), &err);
            return Err(err);
        }

        tracing::debug!(user_id = %ctx.user_id, %community_id, %held, %required, "community role check passed");
        Ok(ctx.with_membership(membership))
    }

    /// `requireGroupRole(r)`: membership in `group_id` with role `r` or group leader.
    pub async fn require_group_role(
        &self,
        ctx: &AuthContext,
        group_id: &GroupId,
        required: GroupRole,
    ) -> Result<AuthContext, AuthError> {
        let membership = self
            .resolver
            .resolve_group_role(group_id, &ctx.user_id)
            .await
            .inspect_err(|e| deny(ctx, &Scope::Group(group_id.clone()), required.as_str(), e))?;

        let held = membership
            .role
            .as_group()
            .ok_or_else(|| AuthError::StoreUnavailable(format!("non-group role for {}", membership.scope)))?;

        if !held.permits(required) {
            let err = AuthError::InsufficientRole;
            deny(ctx, &membership.scope, required.as_str(), &err);
            return Err(err);
        }

        tracing::debug!(user_id = %ctx.user_id, %group_id, %held, %required, "group role check passed");
        Ok(ctx.with_membership(membership))
    }
}

fn deny(ctx: &AuthContext, scope: &Scope, required: &str, err: &AuthError) {
    if err.is_retryable() {
        // Already logged at warn by the resolver.
        return;
    }
    tracing::info!(user_id = %ctx.user_id, %scope, required, reason = err.code(), "scope check denied");
}
