//! Token codec: compact `header.payload.signature` JWTs signed with HS256.
//!
//! The codec is pure: no I/O, no shared mutable state, and no hidden clock.
//! Callers pass `now` explicitly so expiry is deterministic under test.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::claims::{RegisteredClaims, TokenClass};

/// The only signing algorithm this codec accepts.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("token is not three well-formed segments")]
    Malformed,

    #[error("signature verification failed")]
    BadSignature,

    #[error("token declares an unexpected signing algorithm")]
    UnexpectedAlgorithm,

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (nbf is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token was issued by a different issuer")]
    WrongIssuer,

    #[error("token class mismatch")]
    WrongTokenClass,

    #[error("encoding failed: {0}")]
    Encoding(String),
}

/// Encoder/decoder bound to one token class and one signing key.
#[derive(Clone)]
pub struct TokenCodec {
    class: TokenClass,
    issuer: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    leeway_secs: i64,
}

impl TokenCodec {
    pub fn new(class: TokenClass, issuer: impl Into<String>, secret: &[u8], leeway_secs: i64) -> Self {
        // Time and issuer checks are done by `check_registered` against the
        // caller's `now`; the library only verifies algorithm and signature.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            class,
            issuer: issuer.into(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            leeway_secs: leeway_secs.max(0),
        }
    }

    pub fn class(&self) -> TokenClass {
        self.class
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn encode<T>(&self, claims: &T) -> Result<String, CodecError>
    where
        T: Serialize + RegisteredClaims,
    {
        if claims.token_class() != self.class {
            return Err(CodecError::Encoding(format!(
                "{:?} claims cannot be signed with the {:?} key",
                claims.token_class(),
                self.class
            )));
        }

        let mut header = Header::new(ALGORITHM);
        header.typ = Some(self.class.header_typ().to_string());

        jsonwebtoken::encode(&header, claims, &self.encoding)
            .map_err(|e| CodecError::Encoding(e.to_string()))
    }

    /// Decode and fully validate a token of this codec's class.
    ///
    /// Order: structure → declared algorithm → declared class → signature →
    /// signed class → issuer → time window.
    pub fn decode<T>(&self, token: &str, now: DateTime<Utc>) -> Result<T, CodecError>
    where
        T: DeserializeOwned + RegisteredClaims,
    {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(CodecError::Malformed);
        }

        let header = jsonwebtoken::decode_header(token).map_err(|_| CodecError::Malformed)?;
        if header.alg != ALGORITHM {
            return Err(CodecError::UnexpectedAlgorithm);
        }
        if header.typ.as_deref() != Some(self.class.header_typ()) {
            return Err(CodecError::WrongTokenClass);
        }

        let claims = jsonwebtoken::decode::<T>(token, &self.decoding, &self.validation)
            .map_err(map_jwt_error)?
            .claims;

        self.check_registered(&claims, now)?;
        Ok(claims)
    }

    fn check_registered<T: RegisteredClaims>(&self, claims: &T, now: DateTime<Utc>) -> Result<(), CodecError> {
        if claims.token_class() != self.class {
            return Err(CodecError::WrongTokenClass);
        }
        if claims.issuer() != self.issuer {
            return Err(CodecError::WrongIssuer);
        }
        check_time_window(claims, now, self.leeway_secs)
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("class", &self.class)
            .field("issuer", &self.issuer)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

/// Deterministically validate the time window of registered claims.
pub fn check_time_window<T: RegisteredClaims + ?Sized>(
    claims: &T,
    now: DateTime<Utc>,
    leeway_secs: i64,
) -> Result<(), CodecError> {
    if claims.expires_at_ts() <= claims.issued_at_ts() {
        return Err(CodecError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now.saturating_add(leeway_secs) < claims.not_before_ts() {
        return Err(CodecError::NotYetValid);
    }
    if now > claims.expires_at_ts().saturating_add(leeway_secs) {
        return Err(CodecError::Expired);
    }
    Ok(())
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> CodecError {
    match err.kind() {
        ErrorKind::InvalidSignature => CodecError::BadSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => CodecError::UnexpectedAlgorithm,
        ErrorKind::ExpiredSignature => CodecError::Expired,
        ErrorKind::ImmatureSignature => CodecError::NotYetValid,
        _ => CodecError::Malformed,
    }
}
