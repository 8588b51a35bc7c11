//! Session lifecycle: login and refresh.

use chrono::{DateTime, Utc};

use guildhall_core::{CommunityId, UserId};

use crate::claims::{Claims, TokenPair};
use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use crate::issuer::{SessionSubject, TokenIssuer};
use crate::roles::PlatformRole;
use crate::validator::TokenValidator;

/// Issues and renews session token pairs. Stateless: nothing is persisted.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    issuer: TokenIssuer,
    validator: TokenValidator,
}

impl SessionTokens {
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            issuer: TokenIssuer::new(config)?,
            validator: TokenValidator::new(config)?,
        })
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Open a session for an already-authenticated identity.
    pub fn login(
        &self,
        user_id: UserId,
        platform_role: PlatformRole,
        community_id: Option<CommunityId>,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        self.issue(&SessionSubject::new(user_id, platform_role).in_community(community_id), now)
    }

    pub fn issue(&self, subject: &SessionSubject, now: DateTime<Utc>) -> Result<TokenPair, AuthError> {
        let pair = self.issuer.issue(subject, now)?;
        tracing::info!(
            user_id = %subject.user_id,
            platform_role = %subject.platform_role,
            community_id = subject.community_id.as_ref().map(|c| c.as_str()),
            "session issued"
        );
        Ok(pair)
    }

    pub fn validate_access(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        self.validator.validate_access(token, now)
    }

    /// Exchange a valid refresh token for a new pair bound to the same
    /// user, community and platform role. The access window restarts at
    /// `now`; the presented refresh token stays valid until its own expiry.
    pub fn refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<TokenPair, AuthError> {
        let claims = self.validator.validate_refresh(refresh_token, now)?;
        let subject = SessionSubject::from_claims(&claims);
        let pair = self.issuer.issue(&subject, now)?;
        tracing::info!(user_id = %subject.user_id, refresh_jti = %claims.jti, "session refreshed");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::config;
    use chrono::Duration;

    fn sessions() -> SessionTokens {
        SessionTokens::new(&config()).unwrap()
    }

    fn u1() -> UserId {
        UserId::parse("u1").unwrap()
    }

    #[test]
    fn issued_access_token_validates_immediately() {
        let sessions = sessions();
        let now = Utc::now();
        let pair = sessions.login(u1(), PlatformRole::Member, None, now).unwrap();

        let claims = sessions.validate_access(&pair.access_token, now).unwrap();
        assert_eq!(claims.user_id().as_str(), "u1");
        assert_eq!(claims.role, PlatformRole::Member);
        assert_eq!(claims.identity().user_id, u1());
    }

    #[test]
    fn access_token_expires_after_configured_ttl() {
        let sessions = sessions();
        let now = Utc::now();
        let pair = sessions.login(u1(), PlatformRole::Admin, None, now).unwrap();

        let later = now + Duration::seconds(3600) + Duration::seconds(1);
        assert_eq!(
            sessions.validate_access(&pair.access_token, later),
            Err(AuthError::ExpiredToken)
        );
    }

    #[test]
    fn refresh_after_access_expiry_yields_a_working_pair() {
        let sessions = sessions();
        let now = Utc::now();
        let pair = sessions.login(u1(), PlatformRole::Member, None, now).unwrap();

        let later = now + Duration::hours(2);
        assert_eq!(
            sessions.validate_access(&pair.access_token, later),
            Err(AuthError::ExpiredToken)
        );

        let renewed = sessions.refresh(&pair.refresh_token, later).unwrap();
        let claims = sessions.validate_access(&renewed.access_token, later).unwrap();
        assert_eq!(claims.user_id().as_str(), "u1");
        assert_eq!(claims.iat, later.timestamp());
        assert_eq!(claims.exp, (later + Duration::hours(1)).timestamp());
    }

    #[test]
    fn refresh_preserves_community_and_role() {
        let sessions = sessions();
        let now = Utc::now();
        let community = CommunityId::parse("c-9").unwrap();
        let pair = sessions
            .login(u1(), PlatformRole::SuperAdmin, Some(community.clone()), now)
            .unwrap();

        let renewed = sessions.refresh(&pair.refresh_token, now).unwrap();
        let claims = sessions.validate_access(&renewed.access_token, now).unwrap();
        assert_eq!(claims.role, PlatformRole::SuperAdmin);
        assert_eq!(claims.cid, Some(community));
    }

    #[test]
    fn old_refresh_token_remains_usable_until_expiry() {
        let sessions = sessions();
        let now = Utc::now();
        let pair = sessions.login(u1(), PlatformRole::Member, None, now).unwrap();

        assert!(sessions.refresh(&pair.refresh_token, now).is_ok());
        assert!(sessions.refresh(&pair.refresh_token, now + Duration::days(1)).is_ok());
        assert_eq!(
            sessions.refresh(&pair.refresh_token, now + Duration::days(15)),
            Err(AuthError::ExpiredToken)
        );
    }

    #[test]
    fn token_classes_are_not_interchangeable() {
        let sessions = sessions();
        let now = Utc::now();
        let pair = sessions.login(u1(), PlatformRole::Member, None, now).unwrap();

        assert_eq!(
            sessions.validate_access(&pair.refresh_token, now),
            Err(AuthError::WrongTokenClass)
        );
        assert_eq!(
            sessions.validator().validate_refresh(&pair.access_token, now),
            Err(AuthError::WrongTokenClass)
        );
        assert_eq!(
            sessions.refresh(&pair.access_token, now),
            Err(AuthError::WrongTokenClass)
        );
    }

    #[test]
    fn tokens_from_another_deployment_fail_signature() {
        let now = Utc::now();
        let mut other_cfg = config();
        other_cfg.access_secret = "a-completely-different-access-secret-000".into();
        let other = SessionTokens::new(&other_cfg).unwrap();
        let pair = other.login(u1(), PlatformRole::SuperAdmin, None, now).unwrap();

        assert_eq!(
            sessions().validate_access(&pair.access_token, now),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            sessions().validate_access("definitely-not-a-jwt", Utc::now()),
            Err(AuthError::MalformedToken)
        );
    }
}
