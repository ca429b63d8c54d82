//! User records and the Postgres-backed store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;

pub mod seed;

/// Stored credential material for a single user. The hash is opaque and
/// self-describing; the core never inspects it.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
}

/// Source of truth for credential hashes. The login pipeline only reads
/// through this interface; writes happen via the admin seed.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by username. `Ok(None)` when the username is unknown.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;
}

/// `UserStore` backed by the `users` table.
#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let query = "SELECT username, password_hash FROM users WHERE username = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user")?;

        Ok(row.map(|row| UserRecord {
            username: row.get("username"),
            password_hash: row.get("password_hash"),
        }))
    }
}

/// Create the `users` table when it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    let query = r"
        CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL
        )
    ";
    sqlx::query(query)
        .execute(pool)
        .await
        .context("failed to ensure users table")?;

    Ok(())
}
