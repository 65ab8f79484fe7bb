//! # Database Handle
//!
//! Opens the SQLite file behind a Cotiza installation and hands out
//! repositories.
//!
//! ## Opening Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new("./cotiza.db")          DbConfig::in_memory()            │
//! │       │                                      │                          │
//! │       ▼                                      ▼                          │
//! │  DbLocation::File(path)                DbLocation::Memory               │
//! │       │  create file, WAL journal            │  one pinned connection   │
//! │       │  NORMAL sync, busy timeout           │  never idles out         │
//! │       └──────────────┬───────────────────────┘                          │
//! │                      ▼                                                  │
//! │        foreign_keys = ON (line rows cascade with their document)        │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │        SqlitePool ──► migrations::run (unless disabled)                 │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │        Database ──► products() invoices() quotations() settings()       │
//! │                 └─► cotiza-core store traits (store.rs)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invoice commits take the SQLite write lock for the whole transaction, so
//! a second CLI process waits up to `busy_timeout` instead of failing at
//! once.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::invoice::InvoiceRepository;
use crate::repository::product::ProductRepository;
use crate::repository::quotation::QuotationRepository;
use crate::repository::settings::SettingsRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A database file, created on first open.
    File(PathBuf),
    /// A private in-memory database that disappears with the pool.
    Memory,
}

/// Settings for [`Database::new`].
///
/// ```rust,ignore
/// let config = DbConfig::new("./cotiza.db").max_connections(5);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,
    /// Default 5. Always 1 for [`DbLocation::Memory`].
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a caller waits for a free pooled connection.
    pub acquire_timeout: Duration,
    /// How long SQLite retries while another writer holds the lock.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        DbConfig {
            location: DbLocation::File(path.as_ref().to_path_buf()),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// In-memory database for tests.
    ///
    /// Each SQLite connection to `:memory:` sees its own empty database, so
    /// the pool holds exactly one connection for its whole lifetime.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Human-readable location for logs and error messages.
    pub fn describe(&self) -> String {
        match &self.location {
            DbLocation::File(path) => path.display().to_string(),
            DbLocation::Memory => ":memory:".to_string(),
        }
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::Connection(e.to_string()))?,
        };

        Ok(options.foreign_keys(true).busy_timeout(self.busy_timeout))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);

        match self.location {
            DbLocation::File(_) => options
                .max_connections(self.max_connections.max(1))
                .min_connections(self.min_connections.min(self.max_connections)),
            DbLocation::Memory => options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the Cotiza database. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let location = config.describe();
        debug!(location = %location, "Opening database");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::Connection(format!("{}: {}", location, e)))?;

        let db = Database { pool };
        if config.run_migrations {
            migrations::run(&db.pool).await?;
        }

        info!(location = %location, max_connections = config.max_connections, "Database opened");
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone())
    }

    pub fn quotations(&self) -> QuotationRepository {
        QuotationRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections and closes the pool. WAL contents
    /// are checkpointed into the main file when the last connection closes.
    pub async fn close(&self) {
        debug!("Closing database");
        self.pool.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_description() {
        let config = DbConfig::new("/tmp/cotiza-test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250))
            .run_migrations(false);

        assert_eq!(config.location, DbLocation::File(PathBuf::from("/tmp/cotiza-test.db")));
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.run_migrations);
        assert_eq!(config.describe(), "/tmp/cotiza-test.db");
        assert_eq!(DbConfig::in_memory().describe(), ":memory:");
    }

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let settings = db.settings().load().await.unwrap();
        assert_eq!(settings.last_invoice_number, 0);
        assert!(db.products().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unmigrated_database_has_no_tables() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false)).await.unwrap();

        assert!(db.products().list().await.is_err());
    }

    #[tokio::test]
    async fn test_file_database_persists_between_pools() {
        let path = std::env::temp_dir().join(format!("cotiza-{}.db", uuid::Uuid::new_v4()));

        {
            let db = Database::new(DbConfig::new(&path)).await.unwrap();
            assert_eq!(db.settings().advance_invoice_counter().await.unwrap(), 1);
            db.close().await;
        }

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(db.settings().advance_invoice_counter().await.unwrap(), 2);
        db.close().await;

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }
}
