//! Token issuer: builds access/refresh pairs for an authenticated identity.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use guildhall_core::{CommunityId, UserId};

use crate::claims::{Claims, TokenClass, TokenPair};
use crate::codec::TokenCodec;
use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use crate::roles::{CommunityRole, PlatformRole};

/// Who a session is opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSubject {
    pub user_id: UserId,
    pub platform_role: PlatformRole,
    pub community_id: Option<CommunityId>,
    pub community_role: Option<CommunityRole>,
}

impl SessionSubject {
    pub fn new(user_id: UserId, platform_role: PlatformRole) -> Self {
        Self {
            user_id,
            platform_role,
            community_id: None,
            community_role: None,
        }
    }

    pub fn in_community(mut self, community_id: Option<CommunityId>) -> Self {
        self.community_id = community_id;
        self
    }

    pub fn with_community_role(mut self, role: Option<CommunityRole>) -> Self {
        self.community_role = role;
        self
    }

    pub(crate) fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            platform_role: claims.role,
            community_id: claims.cid.clone(),
            community_role: claims.scope_role,
        }
    }
}

/// Signs session tokens. Access and refresh tokens use distinct keys so a
/// leaked access token can never be used to mint refresh tokens.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    access: TokenCodec,
    refresh: TokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            access: session_codec(config, TokenClass::Access),
            refresh: session_codec(config, TokenClass::Refresh),
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Issue a fresh pair; both tokens start their window at `now`.
    pub fn issue(&self, subject: &SessionSubject, now: DateTime<Utc>) -> Result<TokenPair, AuthError> {
        let access = self.claims(subject, TokenClass::Access, now, self.access_ttl)?;
        let refresh = self.claims(subject, TokenClass::Refresh, now, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token: self.access.encode(&access)?,
            refresh_token: self.refresh.encode(&refresh)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    fn claims(
        &self,
        subject: &SessionSubject,
        class: TokenClass,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Claims, AuthError> {
        Ok(Claims {
            sub: subject.user_id.clone(),
            cid: subject.community_id.clone(),
            role: subject.platform_role,
            scope_role: subject.community_role,
            iss: self.access.issuer().to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at(now, ttl)?,
            jti: Uuid::new_v4().to_string(),
            tkn: class,
        })
    }
}

/// `now + ttl` as a unix timestamp, failing instead of overflowing.
pub(crate) fn expires_at(now: DateTime<Utc>, ttl: Duration) -> Result<i64, AuthError> {
    now.checked_add_signed(ttl)
        .map(|exp| exp.timestamp())
        .ok_or_else(|| AuthError::Signing(format!("expiry out of range for ttl {}s", ttl.num_seconds())))
}

/// Codec for a session token class, keyed by that class's secret.
pub(crate) fn session_codec(config: &AuthConfig, class: TokenClass) -> TokenCodec {
    let secret = match class {
        TokenClass::Access => &config.access_secret,
        TokenClass::Refresh => &config.refresh_secret,
        TokenClass::Action => &config.action_secret,
    };
    TokenCodec::new(class, config.issuer.clone(), secret.as_bytes(), config.leeway_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::config;

    fn subject() -> SessionSubject {
        SessionSubject::new(UserId::parse("u1").unwrap(), PlatformRole::Member)
            .in_community(Some(CommunityId::parse("c1").unwrap()))
    }

    #[test]
    fn pair_reports_access_lifetime() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let pair = issuer.issue(&subject(), Utc::now()).unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 3600);
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[test]
    fn claims_carry_subject_and_window() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let now = Utc::now();
        let claims = issuer.claims(&subject(), TokenClass::Access, now, issuer.access_ttl).unwrap();

        assert_eq!(claims.sub.as_str(), "u1");
        assert_eq!(claims.cid.as_ref().map(|c| c.as_str()), Some("c1"));
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.nbf, claims.iat);
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.iss, "guildhall-test");
    }

    #[test]
    fn each_token_gets_a_unique_id() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let now = Utc::now();
        let a = issuer.claims(&subject(), TokenClass::Access, now, issuer.access_ttl).unwrap();
        let b = issuer.claims(&subject(), TokenClass::Access, now, issuer.access_ttl).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn expiry_past_the_calendar_is_an_error() {
        let now = Utc::now();
        assert_eq!(expires_at(now, Duration::hours(1)), Ok((now + Duration::hours(1)).timestamp()));
        assert!(matches!(
            expires_at(DateTime::<Utc>::MAX_UTC, Duration::seconds(1)),
            Err(AuthError::Signing(_))
        ));
    }

    #[test]
    fn oversized_lifetime_is_refused_before_issuing() {
        let mut cfg = config();
        cfg.refresh_ttl_secs = 10_000_000_000_000;
        assert!(matches!(
            TokenIssuer::new(&cfg),
            Err(ConfigError::TtlTooLong("refresh_ttl_secs", _))
        ));
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut cfg = config();
        cfg.refresh_secret = cfg.access_secret.clone();
        assert!(TokenIssuer::new(&cfg).is_err());
    }
}
