//! Account flows: password login and action-token completion.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use guildhall_core::{CommunityId, UserId};

use crate::action::{ActionPurpose, ActionTokens};
use crate::claims::TokenPair;
use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use crate::issuer::SessionSubject;
use crate::password::{
    DUMMY_PASSWORD_HASH, PasswordError, hash_password_blocking, validate_password_strength, verify_password_blocking,
};
use crate::resolver::{ScopeResolver, bounded};
use crate::session::SessionTokens;
use crate::store::{AccountStore, CredentialStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

pub struct AccountService<S: ?Sized> {
    sessions: SessionTokens,
    actions: ActionTokens,
    resolver: ScopeResolver<S>,
    store: Arc<S>,
}

impl<S: ?Sized> Clone for AccountService<S> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            actions: self.actions.clone(),
            resolver: self.resolver.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S: ?Sized> core::fmt::Debug for AccountService<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountService")
            .field("sessions", &self.sessions)
            .field("actions", &self.actions)
            .field("timeout", &self.resolver.timeout())
            .finish_non_exhaustive()
    }
}

impl<S> AccountService<S>
where
    S: CredentialStore + AccountStore + ?Sized,
{
    pub fn new(config: &AuthConfig, store: Arc<S>) -> Result<Self, ConfigError> {
        Ok(Self {
            sessions: SessionTokens::new(config)?,
            actions: ActionTokens::new(config)?,
            resolver: ScopeResolver::new(store.clone(), config.store_timeout()),
            store,
        })
    }

    pub fn sessions(&self) -> &SessionTokens {
        &self.sessions
    }

    pub fn actions(&self) -> &ActionTokens {
        &self.actions
    }

    /// Verify a password and open a session.
    ///
    /// Unknown users, users without a password and wrong passwords all fail
    /// with [`AuthError::InvalidCredentials`]. Opening a session inside a
    /// community requires membership there.
    pub async fn login_with_password(
        &self,
        user_id: &UserId,
        password: &str,
        community_id: Option<CommunityId>,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        let platform_role = self.resolver.platform_role(user_id).await?;
        let hash = bounded(self.resolver.timeout(), self.store.find_password_hash(user_id))
            .await
            .inspect_err(|e| tracing::warn!(%user_id, error = %e, "password lookup failed"))?;

        let has_hash = hash.is_some();
        let verified = self.check_password(password, hash).await;
        let (Some(platform_role), true) = (platform_role, has_hash) else {
            tracing::info!(%user_id, "login rejected: unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        match verified {
            Ok(()) => {}
            Err(PasswordError::InvalidHashFormat) => {
                tracing::warn!(%user_id, "stored password hash is unreadable");
                return Err(AuthError::InvalidCredentials);
            }
            Err(_) => {
                tracing::info!(%user_id, "login rejected: password mismatch");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let community_role = match &community_id {
            Some(cid) => self
                .resolver
                .resolve_community_role(cid, user_id)
                .await?
                .role
                .as_community(),
            None => None,
        };

        let subject = SessionSubject::new(user_id.clone(), platform_role)
            .in_community(community_id)
            .with_community_role(community_role);
        self.sessions.issue(&subject, now)
    }

    /// Mint an action token for a known user. `Ok(None)` for unknown users so
    /// callers can answer uniformly without revealing account existence.
    pub async fn request_action(
        &self,
        user_id: &UserId,
        purpose: ActionPurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AuthError> {
        if self.resolver.platform_role(user_id).await?.is_none() {
            tracing::info!(%user_id, %purpose, "action requested for unknown user");
            return Ok(None);
        }
        self.actions.issue(user_id.clone(), purpose, now).map(Some)
    }

    /// Complete a password reset: consume the token, then store the new hash.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserId, AccountError> {
        let user_id = self.actions.consume(token, ActionPurpose::PasswordReset, now)?;
        validate_password_strength(new_password)?;
        let hash = hash_password_blocking(new_password.to_string()).await?;

        self.write(&user_id, self.store.set_password_hash(&user_id, hash)).await?;
        tracing::info!(%user_id, "password reset completed");
        Ok(user_id)
    }

    /// Complete email verification, stamping the account as verified at `now`.
    pub async fn verify_email(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        let user_id = self.actions.consume(token, ActionPurpose::EmailVerification, now)?;

        self.write(&user_id, self.store.mark_email_verified(&user_id, now)).await?;
        tracing::info!(%user_id, "email verified");
        Ok(user_id)
    }

    /// Verify against the stored hash, or against [`DUMMY_PASSWORD_HASH`]
    /// when there is none.
    async fn check_password(&self, password: &str, stored: Option<String>) -> Result<(), PasswordError> {
        let hash = stored.unwrap_or_else(|| DUMMY_PASSWORD_HASH.to_string());
        verify_password_blocking(password.to_string(), hash).await
    }

    async fn write(
        &self,
        user_id: &UserId,
        call: impl Future<Output = Result<(), StoreError>>,
    ) -> Result<(), AuthError> {
        let timeout = self.resolver.timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(())) => Ok(()),
            // The token was genuine but the account is gone.
            Ok(Err(StoreError::UnknownUser)) => {
                tracing::info!(%user_id, "account write rejected: unknown user");
                Err(AuthError::InvalidCredentials)
            }
            Ok(Err(e)) => {
                tracing::warn!(%user_id, error = %e, "account write failed");
                Err(AuthError::from(e))
            }
            Err(_) => {
                tracing::warn!(%user_id, "account write timed out");
                Err(AuthError::from(StoreError::Unavailable(format!(
                    "write exceeded {}ms",
                    timeout.as_millis()
                ))))
            }
        }
    }
}
