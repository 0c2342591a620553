use sqlx::{Executor, SqlitePool};

use super::{duplicates, StoreError};

/// Schema migrations in the order they must be applied
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_initial.sql")),
    (2, include_str!("../../migrations/002_identity_keys.sql")),
];

/// Run all pending migrations in order.
///
/// Each migration runs in its own transaction and records its version in
/// `schema_version`, so running this again is a no-op. Rows without an
/// identity key are filled in afterwards.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
    let current = current_version(pool).await?;

    for &(version, sql) in MIGRATIONS {
        if version <= current {
            continue;
        }

        tracing::info!("Running migration v{version}");
        let mut tx = pool.begin().await?;
        (&mut *tx).execute(sql).await.map_err(|e| StoreError::Migration {
            version,
            reason: e.to_string(),
        })?;
        tx.commit().await?;
    }

    let mut tx = pool.begin().await?;
    let filled = duplicates::backfill_identity_keys(&mut *tx).await?;
    tx.commit().await?;
    if filled > 0 {
        tracing::info!(rows = filled, "Backfilled identity keys");
    }

    Ok(())
}

/// Current schema version; 0 if no schema exists yet
pub async fn current_version(pool: &SqlitePool) -> Result<i64, StoreError> {
    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
    )
    .fetch_one(pool)
    .await?;
    if tables == 0 {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}
