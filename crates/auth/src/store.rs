//! Credential store seam.
//!
//! The store is an external collaborator; this crate only defines what it
//! must answer. Implementations live in infrastructure crates.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use guildhall_core::UserId;

use crate::roles::{PlatformRole, Scope, ScopeRole};

/// A user's membership in one nested scope. Owned and persisted by the
/// store; the authorization core reads it and never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeMembership {
    pub scope: Scope,
    pub user_id: UserId,
    pub role: ScopeRole,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transient failure (connection, pool exhaustion, timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store returned data that cannot be interpreted.
    #[error("invalid store record: {0}")]
    InvalidRecord(String),

    /// A write targeted a user the store does not know.
    #[error("unknown user")]
    UnknownUser,
}

/// Read-only role lookups used by authorization.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when the user holds no membership in `scope`.
    async fn find_membership(
        &self,
        scope: &Scope,
        user_id: &UserId,
    ) -> Result<Option<ScopeMembership>, StoreError>;

    async fn find_user_platform_role(&self, user_id: &UserId) -> Result<Option<PlatformRole>, StoreError>;
}

/// Account secrets and verification state, used by the password login and
/// action-token completion flows.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_password_hash(&self, user_id: &UserId) -> Result<Option<String>, StoreError>;

    async fn set_password_hash(&self, user_id: &UserId, password_hash: String) -> Result<(), StoreError>;

    async fn mark_email_verified(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn find_membership(
        &self,
        scope: &Scope,
        user_id: &UserId,
    ) -> Result<Option<ScopeMembership>, StoreError> {
        (**self).find_membership(scope, user_id).await
    }

    async fn find_user_platform_role(&self, user_id: &UserId) -> Result<Option<PlatformRole>, StoreError> {
        (**self).find_user_platform_role(user_id).await
    }
}

#[async_trait]
impl<S> AccountStore for Arc<S>
where
    S: AccountStore + ?Sized,
{
    async fn find_password_hash(&self, user_id: &UserId) -> Result<Option<String>, StoreError> {
        (**self).find_password_hash(user_id).await
    }

    async fn set_password_hash(&self, user_id: &UserId, password_hash: String) -> Result<(), StoreError> {
        (**self).set_password_hash(user_id, password_hash).await
    }

    async fn mark_email_verified(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).mark_email_verified(user_id, at).await
    }
}
