//! Process configuration: defaults → optional file → `GUILDHALL__*` env.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use guildhall_auth::AuthConfig;
use guildhall_observability::LoggingConfig;

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid auth configuration: {0}")]
    Auth(#[from] guildhall_auth::ConfigError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Selects the credential store: Postgres when `url` is set, otherwise the
/// in-memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
    /// Run the credential DDL at startup.
    pub ensure_schema: bool,
}

/// A super-admin account created in the in-memory store at startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub user_id: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
}

impl AppConfig {
    /// Load configuration. `.env` is read first (if present) so its values
    /// participate in the environment layer.
    pub fn load(path: Option<&Path>) -> Result<Self, AppConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("auth.issuer", "guildhall")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_ms", 3_000)?
            .set_default("database.ensure_schema", false)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let cfg: AppConfig = builder
            .add_source(
                config::Environment::with_prefix("GUILDHALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        cfg.auth.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "guildhall-config-{}-{}.toml",
            std::process::id(),
            contents.len()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn file_values_fill_in_around_defaults() {
        let path = write_config(
            r#"
            [auth]
            access_secret = "access-secret-from-file-0123456789abcdef"
            refresh_secret = "refresh-secret-from-file-0123456789abcdef"
            action_secret = "action-secret-from-file-0123456789abcdef"
            access_ttl_secs = 600
            "#,
        );

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.auth.issuer, "guildhall");
        assert_eq!(cfg.auth.access_ttl_secs, 600);
        assert_eq!(cfg.auth.refresh_ttl_secs, 14 * 24 * 3600);
        assert!(cfg.database.url.is_none());
        assert!(cfg.bootstrap.is_none());
    }

    #[test]
    fn weak_secrets_fail_at_load() {
        let path = write_config(
            r#"
            [auth]
            access_secret = "short"
            refresh_secret = "refresh-secret-from-file-0123456789abcdef"
            action_secret = "action-secret-from-file-0123456789abcdef"
            "#,
        );

        assert!(matches!(AppConfig::load(Some(&path)), Err(AppConfigError::Auth(_))));
    }
}
