//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied by `Database::new`. sqlx records each applied version in
//! `_sqlx_migrations`, so running them again is a no-op.
//!
//! ```text
//!   migrations/sqlite/
//!   └── 001_initial_schema.sql    documents table, store / field indexes
//! ```
//!
//! Files are append-only: a schema change is a new `NNN_*.sql` file.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (known, applied) = migration_status(pool).await?;
    if applied >= known {
        debug!(version = applied, "Schema up to date");
        return Ok(());
    }

    MIGRATOR.run(pool).await?;
    info!(from = applied, to = known, "Schema migrated");
    Ok(())
}

/// `(embedded, applied)` migration counts. A fresh file reports 0 applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let known = MIGRATOR.iter().count();

    let table: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;
    if table.is_none() {
        return Ok((known, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;
    Ok((known, usize::try_from(applied).unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_open_applies_every_migration() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (known, applied) = migration_status(db.pool()).await.unwrap();
        assert!(known >= 1);
        assert_eq!(known, applied);

        // second run is a no-op
        run_migrations(db.pool()).await.unwrap();
        assert_eq!(migration_status(db.pool()).await.unwrap(), (known, applied));
    }

    #[tokio::test]
    async fn test_unmigrated_database_reports_zero() {
        let db = Database::new(DbConfig::in_memory().skip_migrations()).await.unwrap();
        let (known, applied) = migration_status(db.pool()).await.unwrap();
        assert!(known >= 1);
        assert_eq!(applied, 0);
    }
}
