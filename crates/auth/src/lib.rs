//! `guildhall-auth`: token codec, session lifecycle and hierarchical
//! authorization (platform → community → group).
//!
//! This crate is decoupled from HTTP and storage. Role lookups go through the
//! [`CredentialStore`] seam; the HTTP layer only parses headers and maps
//! [`AuthErrorClass`] to status codes.

pub mod accounts;
pub mod action;
pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod gate;
pub mod issuer;
pub mod password;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod store;
pub mod validator;

pub use accounts::{AccountError, AccountService};
pub use action::{ActionClaims, ActionPurpose, ActionTokens};
pub use claims::{Claims, Identity, TokenClass, TokenPair};
pub use codec::{CodecError, TokenCodec};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, AuthErrorClass};
pub use gate::{AuthContext, AuthGate, parse_bearer};
pub use issuer::{SessionSubject, TokenIssuer};
pub use password::PasswordError;
pub use resolver::ScopeResolver;
pub use roles::{CommunityRole, GroupRole, PlatformRole, Scope, ScopeKind, ScopeRole};
pub use session::SessionTokens;
pub use store::{AccountStore, CredentialStore, ScopeMembership, StoreError};
pub use validator::TokenValidator;
