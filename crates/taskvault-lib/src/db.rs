// ============================
// crates/taskvault-lib/src/db.rs
// ============================
//! Database pool setup and schema bootstrap.
//!
//! The pool is the process's only shared resource: bounded size, acquire
//! timeout (acquisition fails instead of hanging), idle recycling and a
//! pre-use liveness check. Every unit of work runs within one acquired
//! connection or transaction, released on all exit paths.
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::info;

use crate::config::Settings;

/// Connect a bounded pool according to the configured limits.
pub async fn connect(settings: &Settings) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.pool.max_connections)
        .acquire_timeout(Duration::from_secs(settings.pool.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(settings.pool.idle_timeout_secs))
        .test_before_acquire(settings.pool.test_before_acquire)
        .connect(&settings.database_url)
        .await?;

    info!(
        url = %settings.database_url,
        max_connections = settings.pool.max_connections,
        "connected database pool"
    );

    Ok(pool)
}

/// Create tables if absent.
///
/// The `session` table belongs to the external session issuer; it is
/// created here only so that a fresh development database is usable. The
/// core never writes to it.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            username      TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_active     INTEGER NOT NULL DEFAULT 1,
            is_verified   INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tasks (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT,
            status      TEXT NOT NULL DEFAULT 'pending',
            user_id     TEXT NOT NULL,
            due_date    TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks (user_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS session (
            id         TEXT PRIMARY KEY,
            user_id    TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// An in-memory database with the full schema, for tests.
#[doc(hidden)]
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}
