use guildhall_auth::{AuthContext, PlatformRole, ScopeMembership, ScopeRole};
use guildhall_core::{CommunityId, UserId};

/// Authenticated identity for a request.
///
/// Inserted by `require_auth` and immutable for the rest of the request;
/// scope guards replace it with a copy that carries the resolved membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    auth: AuthContext,
}

impl RequestContext {
    pub fn new(auth: AuthContext) -> Self {
        Self { auth }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn user_id(&self) -> &UserId {
        self.auth.user_id()
    }

    pub fn platform_role(&self) -> PlatformRole {
        self.auth.platform_role()
    }

    pub fn community_id(&self) -> Option<&CommunityId> {
        self.auth.community_id()
    }

    pub fn membership(&self) -> Option<&ScopeMembership> {
        self.auth.membership()
    }

    pub fn scope_role(&self) -> Option<ScopeRole> {
        self.auth.scope_role()
    }
}
