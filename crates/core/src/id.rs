//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are opaque strings owned by the external stores; this layer
//! only guarantees they are non-empty and free of surrounding whitespace.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Identifier of a user (actor identity, token subject).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

/// Identifier of a community (top-level scope).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommunityId(String);

/// Identifier of a group (nested inside a community).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Build an identifier, rejecting empty or whitespace-only input.
            pub fn parse(raw: impl AsRef<str>) -> DomainResult<Self> {
                let trimmed = raw.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

impl_string_newtype!(UserId, "UserId");
impl_string_newtype!(CommunityId, "CommunityId");
impl_string_newtype!(GroupId, "GroupId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let id = UserId::parse("  u1 ").unwrap();
        assert_eq!(id.as_str(), "u1");
        assert_eq!(id.to_string(), "u1");
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        assert!(matches!(
            "".parse::<CommunityId>(),
            Err(DomainError::InvalidId(msg)) if msg.contains("CommunityId")
        ));
        assert!(GroupId::parse("   ").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = GroupId::parse("g-42").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"g-42\"");
        assert!(serde_json::from_str::<GroupId>("\"\"").is_err());
    }
}
