use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use guildhall_auth::{
    AccountStore, CredentialStore, PlatformRole, Scope, ScopeMembership, ScopeRole, StoreError,
};
use guildhall_core::UserId;

#[derive(Debug, Clone, Default)]
struct Account {
    platform_role: PlatformRole,
    password_hash: Option<String>,
    email_verified_at: Option<DateTime<Utc>>,
}

/// In-memory credential store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    accounts: RwLock<HashMap<UserId, Account>>,
    memberships: RwLock<HashMap<(Scope, UserId), ScopeRole>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the account if needed and set its platform role.
    pub fn grant_platform_role(&self, user_id: UserId, role: PlatformRole) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        accounts.entry(user_id).or_default().platform_role = role;
        Ok(())
    }

    /// Insert or replace a membership. Takes effect on the next lookup.
    pub fn grant_membership(&self, scope: Scope, user_id: UserId, role: ScopeRole) -> Result<(), StoreError> {
        if role.kind() != scope.kind() {
            return Err(StoreError::InvalidRecord(format!(
                "{} role cannot be granted in {}",
                role.kind(),
                scope
            )));
        }
        let mut memberships = self.memberships.write().map_err(|_| poisoned())?;
        memberships.insert((scope, user_id), role);
        Ok(())
    }

    pub fn revoke_membership(&self, scope: &Scope, user_id: &UserId) -> Result<(), StoreError> {
        let mut memberships = self.memberships.write().map_err(|_| poisoned())?;
        memberships.remove(&(scope.clone(), user_id.clone()));
        Ok(())
    }

    /// Seed a password hash, creating a member account if needed.
    pub fn seed_password_hash(&self, user_id: UserId, password_hash: String) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        accounts.entry(user_id).or_default().password_hash = Some(password_hash);
        Ok(())
    }

    pub fn email_verified_at(&self, user_id: &UserId) -> Option<DateTime<Utc>> {
        let accounts = self.accounts.read().ok()?;
        accounts.get(user_id)?.email_verified_at
    }

    fn update_account(&self, user_id: &UserId, f: impl FnOnce(&mut Account)) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        let account = accounts.get_mut(user_id).ok_or(StoreError::UnknownUser)?;
        f(account);
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory credential store lock poisoned".to_string())
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_membership(
        &self,
        scope: &Scope,
        user_id: &UserId,
    ) -> Result<Option<ScopeMembership>, StoreError> {
        let memberships = self.memberships.read().map_err(|_| poisoned())?;
        Ok(memberships
            .get(&(scope.clone(), user_id.clone()))
            .map(|role| ScopeMembership {
                scope: scope.clone(),
                user_id: user_id.clone(),
                role: *role,
            }))
    }

    async fn find_user_platform_role(&self, user_id: &UserId) -> Result<Option<PlatformRole>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.get(user_id).map(|a| a.platform_role))
    }
}

#[async_trait]
impl AccountStore for InMemoryCredentialStore {
    async fn find_password_hash(&self, user_id: &UserId) -> Result<Option<String>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.get(user_id).and_then(|a| a.password_hash.clone()))
    }

    async fn set_password_hash(&self, user_id: &UserId, password_hash: String) -> Result<(), StoreError> {
        self.update_account(user_id, |a| a.password_hash = Some(password_hash))
    }

    async fn mark_email_verified(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.update_account(user_id, |a| a.email_verified_at = Some(at))
    }
}
