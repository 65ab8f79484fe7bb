//! # Settings Repository
//!
//! One row, `id = 1`, seeded by the initial migration.
//!
//! ```text
//! settings
//! ├── data                 JSON document, every Settings field but the counter
//! └── last_invoice_number  advanced only by advance_invoice_counter()
//! ```
//!
//! Missing JSON keys fall back to their defaults, so new settings fields
//! never need a data migration.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use cotiza_core::Settings;

/// Repository for the settings row.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the settings, including the current counter value.
    ///
    /// A database without the row yields the defaults.
    pub async fn load(&self) -> DbResult<Settings> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT data, last_invoice_number FROM settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((data, counter)) => {
                let mut settings: Settings = serde_json::from_str(&data)?;
                settings.last_invoice_number = counter as u64;
                Ok(settings)
            }
            None => {
                debug!("No settings row, using defaults");
                Ok(Settings::default())
            }
        }
    }

    /// Stores every field except the counter.
    pub async fn save(&self, settings: &Settings) -> DbResult<()> {
        let data = serde_json::to_string(settings)?;

        sqlx::query(
            r#"
            INSERT INTO settings (id, data, last_invoice_number) VALUES (1, ?1, 0)
            ON CONFLICT (id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(data)
        .execute(&self.pool)
        .await?;

        info!(system_name = %settings.system_name, "Settings saved");
        Ok(())
    }

    /// Increments the invoice counter and returns the new value.
    ///
    /// A single `UPDATE ... RETURNING`, so concurrent callers always see
    /// distinct values.
    pub async fn advance_invoice_counter(&self) -> DbResult<u64> {
        let next: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE settings
            SET last_invoice_number = last_invoice_number + 1
            WHERE id = 1
            RETURNING last_invoice_number
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let next = next.ok_or_else(|| DbError::not_found("Settings", "1"))?;
        debug!(counter = next, "Invoice counter advanced");
        Ok(next as u64)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
