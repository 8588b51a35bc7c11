//! Adapters for the credential-store seam defined in `guildhall-auth`.
//!
//! Both adapters answer role lookups (`CredentialStore`) and account writes
//! (`AccountStore`). Table layout and locking are adapter concerns only.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryCredentialStore;
pub use postgres::PostgresCredentialStore;
