//! Authentication/authorization error taxonomy.
//!
//! Every failure the boundary can produce falls in exactly one [`AuthErrorClass`]:
//! the transport layer maps classes to status codes and never needs to
//! inspect individual variants.

use thiserror::Error;

use crate::codec::CodecError;
use crate::store::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("malformed token")]
    MalformedToken,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("token class not accepted here")]
    WrongTokenClass,

    #[error("action token issued for a different purpose")]
    WrongActionPurpose,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no membership in the requested scope")]
    ScopeNotFound,

    #[error("insufficient role")]
    InsufficientRole,

    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("token could not be signed: {0}")]
    Signing(String),
}

/// Coarse outcome class of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorClass {
    /// Caller is not (validly) logged in. 401-class.
    Unauthenticated,
    /// Caller is logged in but not allowed. 403-class.
    Forbidden,
    /// A collaborator failed transiently. 5xx-class, retryable.
    Unavailable,
    /// Server-side bug or misconfiguration. 5xx-class, not retryable.
    Internal,
}

impl AuthError {
    pub fn class(&self) -> AuthErrorClass {
        match self {
            AuthError::MissingCredential
            | AuthError::MalformedToken
            | AuthError::BadSignature
            | AuthError::ExpiredToken
            | AuthError::NotYetValid
            | AuthError::WrongTokenClass
            | AuthError::WrongActionPurpose
            | AuthError::InvalidCredentials => AuthErrorClass::Unauthenticated,
            AuthError::ScopeNotFound | AuthError::InsufficientRole => AuthErrorClass::Forbidden,
            AuthError::StoreUnavailable(_) => AuthErrorClass::Unavailable,
            AuthError::Signing(_) => AuthErrorClass::Internal,
        }
    }

    /// Only transient collaborator faults are eligible for caller-side retry.
    pub fn is_retryable(&self) -> bool {
        self.class() == AuthErrorClass::Unavailable
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedToken => "malformed_token",
            AuthError::BadSignature => "bad_signature",
            AuthError::ExpiredToken => "expired_token",
            AuthError::NotYetValid => "token_not_yet_valid",
            AuthError::WrongTokenClass => "wrong_token_class",
            AuthError::WrongActionPurpose => "wrong_action_purpose",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::ScopeNotFound => "scope_not_found",
            AuthError::InsufficientRole => "insufficient_role",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::Signing(_) => "internal_error",
        }
    }
}

impl From<CodecError> for AuthError {
    fn from(value: CodecError) -> Self {
        match value {
            CodecError::Malformed | CodecError::InvalidTimeWindow | CodecError::WrongIssuer => {
                AuthError::MalformedToken
            }
            // An unexpected algorithm means the signature is not one we accept.
            CodecError::BadSignature | CodecError::UnexpectedAlgorithm => AuthError::BadSignature,
            CodecError::Expired => AuthError::ExpiredToken,
            CodecError::NotYetValid => AuthError::NotYetValid,
            CodecError::WrongTokenClass => AuthError::WrongTokenClass,
            CodecError::Encoding(msg) => AuthError::Signing(msg),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        AuthError::StoreUnavailable(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_are_unauthenticated_and_not_retryable() {
        for err in [
            AuthError::MissingCredential,
            AuthError::MalformedToken,
            AuthError::BadSignature,
            AuthError::ExpiredToken,
            AuthError::WrongTokenClass,
            AuthError::WrongActionPurpose,
        ] {
            assert_eq!(err.class(), AuthErrorClass::Unauthenticated, "{err}");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn permission_failures_are_forbidden() {
        assert_eq!(AuthError::ScopeNotFound.class(), AuthErrorClass::Forbidden);
        assert_eq!(AuthError::InsufficientRole.class(), AuthErrorClass::Forbidden);
    }

    #[test]
    fn only_store_failures_are_retryable() {
        let err = AuthError::from(StoreError::Unavailable("pool timed out".into()));
        assert_eq!(err.class(), AuthErrorClass::Unavailable);
        assert!(err.is_retryable());
        assert!(!AuthError::Signing("boom".into()).is_retryable());
    }

    #[test]
    fn algorithm_confusion_maps_to_bad_signature() {
        assert_eq!(AuthError::from(CodecError::UnexpectedAlgorithm), AuthError::BadSignature);
    }
}
