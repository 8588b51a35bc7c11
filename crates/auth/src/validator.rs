//! Token validator: verifies signature, class, issuer and expiry.

use chrono::{DateTime, Utc};

use crate::claims::{Claims, TokenClass};
use crate::codec::TokenCodec;
use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use crate::issuer::session_codec;

/// Validates session tokens. Each class is checked with its own key; a
/// token of the wrong class fails closed with [`AuthError::WrongTokenClass`].
#[derive(Debug, Clone)]
pub struct TokenValidator {
    access: TokenCodec,
    refresh: TokenCodec,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            access: session_codec(config, TokenClass::Access),
            refresh: session_codec(config, TokenClass::Refresh),
        })
    }

    pub fn validate_access(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        self.validate(&self.access, token, now)
    }

    pub fn validate_refresh(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        self.validate(&self.refresh, token, now)
    }

    fn validate(&self, codec: &TokenCodec, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        codec.decode::<Claims>(token, now).map_err(|e| {
            tracing::debug!(class = ?codec.class(), error = %e, "token rejected");
            AuthError::from(e)
        })
    }
}
