use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use guildhall_core::{CommunityId, UserId};

use crate::roles::{CommunityRole, PlatformRole};

/// Class of a signed token. Each class is signed with its own key and
/// carries its own header `typ`, so one class can never stand in for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    Access,
    Refresh,
    Action,
}

impl TokenClass {
    /// Value of the JOSE header `typ` for this class.
    pub fn header_typ(self) -> &'static str {
        match self {
            TokenClass::Access => "at+jwt",
            TokenClass::Refresh => "rt+jwt",
            TokenClass::Action => "act+jwt",
        }
    }
}

/// Registered claims every token class carries; the codec validates these
/// after the signature has been verified.
pub trait RegisteredClaims {
    fn token_class(&self) -> TokenClass;
    fn issuer(&self) -> &str;
    fn issued_at_ts(&self) -> i64;
    fn not_before_ts(&self) -> i64;
    fn expires_at_ts(&self) -> i64;
}

/// The subject of a session token, immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Session token claims (both access and refresh tokens).
///
/// Timestamps are JWT NumericDate (seconds since the epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user identifier.
    pub sub: UserId,

    /// Community the session was opened in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<CommunityId>,

    /// Platform role at issuance.
    pub role: PlatformRole,

    /// Community role at issuance. Informational only: scoped gates always
    /// re-read membership from the credential store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_role: Option<CommunityRole>,

    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
    pub tkn: TokenClass,
}

impl Claims {
    pub fn user_id(&self) -> &UserId {
        &self.sub
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        from_ts(self.iat)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        from_ts(self.exp)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub.clone(),
            issued_at: self.issued_at(),
            expires_at: self.expires_at(),
        }
    }
}

impl RegisteredClaims for Claims {
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

pub(crate) fn from_ts(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Access + refresh token pair handed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}
