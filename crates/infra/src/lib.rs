//! Infrastructure layer: credential-store adapters.

pub mod credentials;

pub use credentials::{InMemoryCredentialStore, PostgresCredentialStore};
