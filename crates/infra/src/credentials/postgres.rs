//! Postgres-backed credential store.
//!
//! ## Tables
//!
//! | Table | Columns |
//! |-------|---------|
//! | `users` | `id`, `platform_role`, `password_hash`, `email_verified_at` |
//! | `community_members` | `community_id`, `user_id`, `role` |
//! | `group_members` | `group_id`, `user_id`, `role` |
//!
//! Roles are stored as their kebab-case names. A role string this crate does
//! not recognize is reported as `StoreError::InvalidRecord`, never guessed.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Pool timeout / closed, I/O, TLS, protocol, database | `Unavailable` |
//! | Column decode / missing column | `InvalidRecord` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use guildhall_auth::{
    AccountStore, CommunityRole, CredentialStore, GroupRole, PlatformRole, Scope, ScopeMembership, ScopeRole,
    StoreError,
};
use guildhall_core::UserId;

/// DDL for the tables this adapter reads and writes.
pub const SCHEMA: &str = include_str!("../../schema/credentials.sql");

#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: Arc<PgPool>,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the credential tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn membership_row(&self, scope: &Scope, user_id: &UserId) -> Result<Option<PgRow>, StoreError> {
        let sql = match scope {
            Scope::Community(_) => {
                "SELECT role FROM community_members WHERE community_id = $1 AND user_id = $2"
            }
            Scope::Group(_) => "SELECT role FROM group_members WHERE group_id = $1 AND user_id = $2",
        };

        sqlx::query(sql)
            .bind(scope.id())
            .bind(user_id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_membership", e))
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self), fields(scope = %scope, user_id = %user_id), err)]
    async fn find_membership(
        &self,
        scope: &Scope,
        user_id: &UserId,
    ) -> Result<Option<ScopeMembership>, StoreError> {
        let Some(row) = self.membership_row(scope, user_id).await? else {
            return Ok(None);
        };

        let raw: String = row.try_get("role").map_err(|e| map_sqlx_error("find_membership", e))?;
        let role = parse_scope_role(scope, &raw)?;

        Ok(Some(ScopeMembership {
            scope: scope.clone(),
            user_id: user_id.clone(),
            role,
        }))
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn find_user_platform_role(&self, user_id: &UserId) -> Result<Option<PlatformRole>, StoreError> {
        let row = sqlx::query("SELECT platform_role FROM users WHERE id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_platform_role", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row
            .try_get("platform_role")
            .map_err(|e| map_sqlx_error("find_user_platform_role", e))?;

        PlatformRole::parse(&raw)
            .map(Some)
            .ok_or_else(|| StoreError::InvalidRecord(format!("unknown platform role '{raw}'")))
    }
}

#[async_trait]
impl AccountStore for PostgresCredentialStore {
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn find_password_hash(&self, user_id: &UserId) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT password_hash FROM users WHERE id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_password_hash", e))?;

        match row {
            Some(row) => row
                .try_get::<Option<String>, _>("password_hash")
                .map_err(|e| map_sqlx_error("find_password_hash", e)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, password_hash), fields(user_id = %user_id), err)]
    async fn set_password_hash(&self, user_id: &UserId, password_hash: String) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id.as_str())
            .bind(password_hash)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_password_hash", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UnknownUser);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn mark_email_verified(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET email_verified_at = $2 WHERE id = $1")
            .bind(user_id.as_str())
            .bind(at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("mark_email_verified", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UnknownUser);
        }
        Ok(())
    }
}

fn parse_scope_role(scope: &Scope, raw: &str) -> Result<ScopeRole, StoreError> {
    let role = match scope {
        Scope::Community(_) => CommunityRole::parse(raw).map(ScopeRole::Community),
        Scope::Group(_) => GroupRole::parse(raw).map(ScopeRole::Group),
    };
    role.ok_or_else(|| StoreError::InvalidRecord(format!("unknown {} role '{raw}'", scope.kind())))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) | sqlx::Error::Decode(_) => {
            StoreError::InvalidRecord(format!("{operation}: {err}"))
        }
        sqlx::Error::PoolTimedOut => StoreError::Unavailable(format!("connection pool timed out in {operation}")),
        sqlx::Error::PoolClosed => StoreError::Unavailable(format!("connection pool closed in {operation}")),
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error in {operation}: {}", db_err.message()))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}
