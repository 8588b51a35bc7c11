//! `guildhall-core` — foundation building blocks shared by every crate.
//!
//! This crate contains **pure** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{CommunityId, GroupId, UserId};
