//! Idempotent seeding of the privileged account.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::info;

use crate::auth::hasher::PasswordHasher;

/// Ensure the privileged account exists, hashing its password with the
/// same hasher the login pipeline verifies against. Safe to run on
/// every startup.
pub async fn ensure_admin(
    pool: &PgPool,
    hasher: &PasswordHasher,
    username: &str,
    password: &SecretString,
) -> Result<()> {
    let existing = sqlx::query("SELECT 1 FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("failed to check for existing admin user")?;

    if existing.is_some() {
        info!("Admin user already exists.");
        return Ok(());
    }

    let password_hash = hasher.hash(password.expose_secret())?;

    // ON CONFLICT covers the race between the check and the insert.
    sqlx::query(
        "INSERT INTO users (username, password_hash) VALUES ($1, $2) ON CONFLICT (username) DO NOTHING",
    )
    .bind(username)
    .bind(password_hash)
    .execute(pool)
    .await
    .context("failed to insert admin user")?;

    info!("Admin user created.");

    Ok(())
}
