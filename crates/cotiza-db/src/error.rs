//! # Database Errors
//!
//! ```text
//! sqlx::Error ──► DbError ──► StoreError (cotiza-core) ──► CoreError::Store
//!                   │
//!                   └── full cause logged once, in into_store_error()
//! ```
//!
//! Conditions the billing workflow must react to (duplicate numbers,
//! missing stock) are reported by the repositories as return values, not as
//! errors. Anything that reaches this type is an infrastructure failure.

use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::error;

use cotiza_core::StoreError;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The database file could not be opened or the pool is closed.
    ///
    /// ## When This Occurs
    /// - `COTIZA_DB_PATH` points into a missing or read-only directory
    /// - A call is made after [`crate::Database::close`]
    #[error("Could not open database: {0}")]
    Connection(String),

    /// The embedded schema could not be applied.
    ///
    /// ## When This Occurs
    /// - The file was written by a newer Cotiza with extra migrations
    /// - A migration was edited after being applied
    #[error("Migration failed: {0}")]
    Migration(String),

    /// A row that must exist is missing.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A UNIQUE index rejected the write. `target` is `table.column`.
    ///
    /// ## When This Occurs
    /// - Inserting a product code that is already in the catalog
    #[error("Duplicate value for {target}")]
    Duplicate { target: String },

    /// A CHECK, NOT NULL or FOREIGN KEY constraint rejected the write.
    ///
    /// ## When This Occurs
    /// - A direct write would leave stock negative
    /// - A line row references a document that does not exist
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// Another writer held the database for longer than the busy timeout,
    /// or no pooled connection became free in time.
    #[error("Database is busy")]
    Busy,

    /// The settings row holds JSON that no longer matches [`cotiza_core::Settings`].
    #[error("Stored settings are unreadable: {0}")]
    CorruptSettings(String),

    /// Any other SQL failure.
    #[error("Query failed: {0}")]
    Query(String),
}

impl DbError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        DbError::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Converts into the opaque store error, logging the full cause.
    pub fn into_store_error(self, operation: &str) -> StoreError {
        error!(operation = %operation, error = %self, "Database operation failed");
        StoreError::new(operation, self.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "query returned no rows"),
            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::PoolClosed => DbError::Connection("pool is closed".to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::Duplicate {
                        target: message
                            .rsplit(": ")
                            .next()
                            .unwrap_or(message.as_str())
                            .to_string(),
                    },
                    ErrorKind::ForeignKeyViolation | ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                        DbError::Constraint(message)
                    }
                    _ if message.contains("database is locked") => DbError::Busy,
                    _ => DbError::Query(message),
                }
            }
            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::CorruptSettings(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
