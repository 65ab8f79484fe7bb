//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied by [`crate::Database::new`]. sqlx records each applied version
//! in `_sqlx_migrations`, so reopening an up-to-date file does nothing.
//!
//! ```text
//! 001_initial_schema.sql   products, invoices + invoice_lines,
//!                          quotations + quotation_lines, settings row
//! ```
//!
//! New schema changes go into a new `NNN_description.sql` file. Applied
//! files are checksummed, so editing one breaks every existing database.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far a database is behind the embedded schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migrations compiled into this build.
    pub embedded: usize,
    /// Migrations recorded as successfully applied in the database.
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Applies every embedded migration the database has not seen yet.
pub async fn run(pool: &SqlitePool) -> DbResult<()> {
    let before = status(pool).await?;

    // Runs even when current so edited or unknown versions are reported.
    MIGRATOR.run(pool).await?;

    if before.is_current() {
        debug!(applied = before.applied, "Schema is current");
    } else {
        info!(from = before.applied, to = before.embedded, "Schema migrated");
    }
    Ok(())
}

/// Compares the embedded migrations with the ones recorded in the database.
///
/// A database that was never migrated has no `_sqlx_migrations` table and
/// reports zero applied.
pub async fn status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let embedded = MIGRATOR.iter().count();

    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    let applied: i64 = if has_table {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    } else {
        0
    };

    Ok(MigrationStatus {
        embedded,
        applied: applied.max(0) as usize,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
