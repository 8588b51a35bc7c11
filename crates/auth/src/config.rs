//! Auth configuration (injected at construction, never global).

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum secret length in bytes for HS256 keys.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest lifetime any token class may be configured with (five years).
pub const MAX_TTL_SECS: i64 = 5 * 366 * 24 * 60 * 60;

/// Largest accepted clock-skew tolerance.
pub const MAX_LEEWAY_SECS: i64 = 5 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("issuer must not be empty")]
    EmptyIssuer,

    #[error("secret '{0}' must be at least {} bytes", MIN_SECRET_LEN)]
    WeakSecret(&'static str),

    #[error("secrets '{0}' and '{1}' must differ")]
    ReusedSecret(&'static str, &'static str),

    #[error("'{0}' must be positive")]
    NonPositiveTtl(&'static str),

    #[error("'{0}' must not exceed {1} seconds")]
    TtlTooLong(&'static str, i64),

    #[error("leeway_secs must be between 0 and {} seconds", MAX_LEEWAY_SECS)]
    LeewayOutOfRange,
}

/// Signing secrets, lifetimes and issuer for every token class.
///
/// Loaded once at process start and immutable afterwards. Secrets are
/// redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub issuer: String,
    pub access_secret: String,
    pub refresh_secret: String,
    pub action_secret: String,

    #[serde(default = "defaults::access_ttl_secs")]
    pub access_ttl_secs: i64,
    #[serde(default = "defaults::refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,
    #[serde(default = "defaults::password_reset_ttl_secs")]
    pub password_reset_ttl_secs: i64,
    #[serde(default = "defaults::email_verification_ttl_secs")]
    pub email_verification_ttl_secs: i64,

    /// Clock-skew tolerance applied to `exp`/`nbf`.
    #[serde(default)]
    pub leeway_secs: i64,

    /// Upper bound on a single credential-store read.
    #[serde(default = "defaults::store_timeout_ms")]
    pub store_timeout_ms: u64,
}

mod defaults {
    pub fn access_ttl_secs() -> i64 {
        60 * 60
    }

    pub fn refresh_ttl_secs() -> i64 {
        14 * 24 * 60 * 60
    }

    pub fn password_reset_ttl_secs() -> i64 {
        60 * 60
    }

    pub fn email_verification_ttl_secs() -> i64 {
        24 * 60 * 60
    }

    pub fn store_timeout_ms() -> u64 {
        5_000
    }
}

impl AuthConfig {
    /// Build a config with default lifetimes.
    pub fn new(
        issuer: impl Into<String>,
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        action_secret: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            action_secret: action_secret.into(),
            access_ttl_secs: defaults::access_ttl_secs(),
            refresh_ttl_secs: defaults::refresh_ttl_secs(),
            password_reset_ttl_secs: defaults::password_reset_ttl_secs(),
            email_verification_ttl_secs: defaults::email_verification_ttl_secs(),
            leeway_secs: 0,
            store_timeout_ms: defaults::store_timeout_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::EmptyIssuer);
        }

        let secrets = [
            ("access_secret", &self.access_secret),
            ("refresh_secret", &self.refresh_secret),
            ("action_secret", &self.action_secret),
        ];
        for (name, secret) in secrets {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::WeakSecret(name));
            }
        }
        for (i, (a, sa)) in secrets.iter().enumerate() {
            for (b, sb) in &secrets[i + 1..] {
                if sa == sb {
                    return Err(ConfigError::ReusedSecret(*a, *b));
                }
            }
        }

        let ttls = [
            ("access_ttl_secs", self.access_ttl_secs),
            ("refresh_ttl_secs", self.refresh_ttl_secs),
            ("password_reset_ttl_secs", self.password_reset_ttl_secs),
            ("email_verification_ttl_secs", self.email_verification_ttl_secs),
        ];
        for (name, ttl) in ttls {
            if ttl <= 0 {
                return Err(ConfigError::NonPositiveTtl(name));
            }
            if ttl > MAX_TTL_SECS {
                return Err(ConfigError::TtlTooLong(name, MAX_TTL_SECS));
            }
        }
        if !(0..=MAX_LEEWAY_SECS).contains(&self.leeway_secs) {
            return Err(ConfigError::LeewayOutOfRange);
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::NonPositiveTtl("store_timeout_ms"));
        }

        Ok(())
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::seconds(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_ttl_secs)
    }

    pub fn password_reset_ttl(&self) -> Duration {
        Duration::seconds(self.password_reset_ttl_secs)
    }

    pub fn email_verification_ttl(&self) -> Duration {
        Duration::seconds(self.email_verification_ttl_secs)
    }

    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_timeout_ms)
    }
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("action_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("password_reset_ttl_secs", &self.password_reset_ttl_secs)
            .field("email_verification_ttl_secs", &self.email_verification_ttl_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AuthConfig;

    pub fn config() -> AuthConfig {
        AuthConfig::new(
            "guildhall-test",
            "access-secret-for-tests-0123456789abcdef",
            "refresh-secret-for-tests-0123456789abcdef",
            "action-secret-for-tests-0123456789abcdef",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::config;
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(config().validate(), Ok(()));
    }

    #[test]
    fn short_secrets_are_rejected() {
        let mut cfg = config();
        cfg.refresh_secret = "short".into();
        assert_eq!(cfg.validate(), Err(ConfigError::WeakSecret("refresh_secret")));
    }

    #[test]
    fn access_and_refresh_keys_must_differ() {
        let mut cfg = config();
        cfg.refresh_secret = cfg.access_secret.clone();
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ReusedSecret("access_secret", "refresh_secret"))
        );
    }

    #[test]
    fn ttls_must_be_positive() {
        let mut cfg = config();
        cfg.access_ttl_secs = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::NonPositiveTtl("access_ttl_secs")));
    }

    #[test]
    fn lifetimes_past_the_ceiling_are_rejected() {
        let mut cfg = config();
        cfg.refresh_ttl_secs = 10_000_000_000_000;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::TtlTooLong("refresh_ttl_secs", MAX_TTL_SECS))
        );

        cfg.refresh_ttl_secs = MAX_TTL_SECS;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn leeway_is_bounded() {
        let mut cfg = config();
        cfg.leeway_secs = i64::MAX;
        assert_eq!(cfg.validate(), Err(ConfigError::LeewayOutOfRange));

        cfg.leeway_secs = -1;
        assert_eq!(cfg.validate(), Err(ConfigError::LeewayOutOfRange));

        cfg.leeway_secs = MAX_LEEWAY_SECS;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("access-secret-for-tests"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn missing_lifetimes_fall_back_to_defaults() {
        let cfg: AuthConfig = serde_json::from_value(serde_json::json!({
            "issuer": "guildhall",
            "access_secret": "a".repeat(32),
            "refresh_secret": "r".repeat(32),
            "action_secret": "x".repeat(32),
        }))
        .unwrap();
        assert_eq!(cfg.access_ttl_secs, 3600);
        assert_eq!(cfg.refresh_ttl_secs, 14 * 24 * 3600);
        assert_eq!(cfg.leeway_secs, 0);
    }
}
