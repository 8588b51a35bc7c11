//! Service wiring: credential store selection and the shared request state.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use guildhall_auth::{
    AccountService, AccountStore, AuthConfig, AuthGate, ConfigError, CredentialStore, PasswordError, PlatformRole,
    StoreError, password,
};
use guildhall_core::{DomainError, UserId};
use guildhall_infra::{InMemoryCredentialStore, PostgresCredentialStore};

use crate::config::{AppConfig, BootstrapConfig};

/// Store used by the HTTP layer: role lookups plus account writes.
pub trait CredentialBackend: CredentialStore + AccountStore {}

impl<T> CredentialBackend for T where T: CredentialStore + AccountStore {}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("credential store: {0}")]
    Store(#[from] StoreError),

    #[error("bootstrap account: {0}")]
    BootstrapId(#[from] DomainError),

    #[error("bootstrap account: {0}")]
    BootstrapPassword(#[from] PasswordError),
}

/// Shared, immutable request state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gate: AuthGate<dyn CredentialBackend>,
    pub accounts: AccountService<dyn CredentialBackend>,
}

impl AppState {
    pub fn new(config: &AuthConfig, store: Arc<dyn CredentialBackend>) -> Result<Self, ConfigError> {
        Ok(Self {
            gate: AuthGate::from_config(config, store.clone())?,
            accounts: AccountService::new(config, store)?,
        })
    }
}

/// Build state from process configuration.
pub async fn build_state(config: &AppConfig) -> Result<AppState, StartupError> {
    let store: Arc<dyn CredentialBackend> = match &config.database.url {
        Some(url) => {
            let store = PostgresCredentialStore::connect(
                url,
                config.database.max_connections,
                Duration::from_millis(config.database.acquire_timeout_ms),
            )
            .await?;
            if config.database.ensure_schema {
                store.ensure_schema().await?;
            }
            tracing::info!("using postgres credential store");
            Arc::new(store)
        }
        None => {
            let store = InMemoryCredentialStore::new();
            match &config.bootstrap {
                Some(bootstrap) => seed_bootstrap(&store, bootstrap).await?,
                None => tracing::warn!("using empty in-memory credential store"),
            }
            Arc::new(store)
        }
    };

    Ok(AppState::new(&config.auth, store)?)
}

async fn seed_bootstrap(store: &InMemoryCredentialStore, bootstrap: &BootstrapConfig) -> Result<(), StartupError> {
    let user_id = UserId::parse(&bootstrap.user_id)?;
    password::validate_password_strength(&bootstrap.password)?;
    let hash = password::hash_password_blocking(bootstrap.password.clone()).await?;

    store.grant_platform_role(user_id.clone(), PlatformRole::SuperAdmin)?;
    store.seed_password_hash(user_id.clone(), hash)?;
    tracing::info!(%user_id, "bootstrap super-admin seeded");
    Ok(())
}
