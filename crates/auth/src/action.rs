//! Single-purpose action tokens (password reset, email verification).
//!
//! Action tokens are signed with their own key and carry their own header
//! `typ`, so they can never authenticate a request and session tokens can
//! never complete an action.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use guildhall_core::UserId;

use crate::claims::{RegisteredClaims, TokenClass};
use crate::codec::TokenCodec;
use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use crate::issuer::expires_at;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionPurpose {
    PasswordReset,
    EmailVerification,
}

impl ActionPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionPurpose::PasswordReset => "password-reset",
            ActionPurpose::EmailVerification => "email-verification",
        }
    }
}

impl core::fmt::Display for ActionPurpose {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionClaims {
    pub sub: UserId,
    pub purpose: ActionPurpose,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
    pub tkn: TokenClass,
}

impl RegisteredClaims for ActionClaims {
    fn token_class(&self) -> TokenClass {
        self.tkn
    }

    fn issuer(&self) -> &str {
        &self.iss
    }

    fn issued_at_ts(&self) -> i64 {
        self.iat
    }

    fn not_before_ts(&self) -> i64 {
        self.nbf
    }

    fn expires_at_ts(&self) -> i64 {
        self.exp
    }
}

/// Issues and consumes action tokens.
///
/// Tokens are replayable until expiry; `jti` is carried so a store-backed
/// used-token list can be layered on top.
#[derive(Debug, Clone)]
pub struct ActionTokens {
    codec: TokenCodec,
    password_reset_ttl: Duration,
    email_verification_ttl: Duration,
}

impl ActionTokens {
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            codec: TokenCodec::new(
                TokenClass::Action,
                config.issuer.clone(),
                config.action_secret.as_bytes(),
                config.leeway_secs,
            ),
            password_reset_ttl: config.password_reset_ttl(),
            email_verification_ttl: config.email_verification_ttl(),
        })
    }

    pub fn ttl(&self, purpose: ActionPurpose) -> Duration {
        match purpose {
            ActionPurpose::PasswordReset => self.password_reset_ttl,
            ActionPurpose::EmailVerification => self.email_verification_ttl,
        }
    }

    pub fn issue(&self, user_id: UserId, purpose: ActionPurpose, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = ActionClaims {
            iss: self.codec.issuer().to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at(now, self.ttl(purpose))?,
            jti: Uuid::new_v4().to_string(),
            tkn: TokenClass::Action,
            sub: user_id,
            purpose,
        };
        let token = self.codec.encode(&claims)?;
        tracing::info!(user_id = %claims.sub, %purpose, jti = %claims.jti, "action token issued");
        Ok(token)
    }

    /// Validate `token` for `expected` and return the user it was issued to.
    pub fn consume(&self, token: &str, expected: ActionPurpose, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        let claims = self.codec.decode::<ActionClaims>(token, now).map_err(|e| {
            tracing::debug!(%expected, error = %e, "action token rejected");
            AuthError::from(e)
        })?;

        if claims.purpose != expected {
            tracing::debug!(%expected, presented = %claims.purpose, "action token purpose mismatch");
            return Err(AuthError::WrongActionPurpose);
        }
        Ok(claims.sub)
    }
}
