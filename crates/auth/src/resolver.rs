//! Scope resolver: one credential-store read per check, never cached.
//!
//! Every authorization check re-reads current membership so role changes
//! take effect on the next request. If the caller is dropped mid-read the
//! lookup future is dropped with it and nothing is applied.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use guildhall_core::{CommunityId, GroupId, UserId};

use crate::error::AuthError;
use crate::roles::{PlatformRole, Scope};
use crate::store::{CredentialStore, ScopeMembership, StoreError};

pub struct ScopeResolver<S: ?Sized> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: ?Sized> Clone for ScopeResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S: ?Sized> core::fmt::Debug for ScopeResolver<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScopeResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<S: ?Sized> ScopeResolver<S> {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<S> ScopeResolver<S>
where
    S: CredentialStore + ?Sized,
{
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn resolve_community_role(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
    ) -> Result<ScopeMembership, AuthError> {
        self.resolve(&Scope::Community(community_id.clone()), user_id).await
    }

    pub async fn resolve_group_role(&self, group_id: &GroupId, user_id: &UserId) -> Result<ScopeMembership, AuthError> {
        self.resolve(&Scope::Group(group_id.clone()), user_id).await
    }

    /// Resolve `user_id`'s membership in `scope`.
    ///
    /// No membership is [`AuthError::ScopeNotFound`] (a permission failure);
    /// store faults, timeouts and records for a different scope are
    /// [`AuthError::StoreUnavailable`].
    pub async fn resolve(&self, scope: &Scope, user_id: &UserId) -> Result<ScopeMembership, AuthError> {
        let membership = self
            .bounded(self.store.find_membership(scope, user_id))
            .await
            .inspect_err(|e| tracing::warn!(%scope, %user_id, error = %e, "membership lookup failed"))?
            .ok_or(AuthError::ScopeNotFound)?;

        if membership.scope != *scope || membership.user_id != *user_id || membership.role.kind() != scope.kind() {
            tracing::warn!(%scope, %user_id, returned = %membership.scope, "store returned a foreign membership");
            return Err(AuthError::from(StoreError::InvalidRecord(format!(
                "membership for {} does not match requested {}",
                membership.scope, scope
            ))));
        }

        Ok(membership)
    }

    pub async fn platform_role(&self, user_id: &UserId) -> Result<Option<PlatformRole>, AuthError> {
        self.bounded(self.store.find_user_platform_role(user_id))
            .await
            .inspect_err(|e| tracing::warn!(%user_id, error = %e, "platform role lookup failed"))
    }

    async fn bounded<T>(&self, lookup: impl Future<Output = Result<T, StoreError>>) -> Result<T, AuthError> {
        bounded(self.timeout, lookup).await
    }
}

/// Run a store call under `timeout`; elapsed time counts as unavailability.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, AuthError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(AuthError::from),
        Err(_) => Err(AuthError::from(StoreError::Unavailable(format!(
            "lookup exceeded {}ms",
            timeout.as_millis()
        )))),
    }
}
