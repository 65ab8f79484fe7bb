//! # Quotation Repository
//!
//! Quotations are replaceable: saving a number that already exists swaps
//! the header and every line in one transaction.
//!
//! The status column moves through `pending → accepted | rejected` by
//! explicit request and to `invoiced` only through [`mark_invoiced_in`],
//! which runs inside the invoice commit.
//!
//! ```text
//!   upsert / set_status   WHERE status != 'invoiced'
//!   mark_invoiced_in      WHERE status IN ('pending', 'accepted')
//! ```
//! Every write carries its own status condition, so a conversion that
//! commits between a caller's read and its write is never overwritten.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::lines::{self, LineTable};
use cotiza_core::store::StatusUpdate;
use cotiza_core::{LineItem, Quotation, QuotationStatus, TaxRate};

#[derive(Debug, FromRow)]
struct QuotationRow {
    number: String,
    client: String,
    issued_at: DateTime<Utc>,
    tax_bps: i64,
    notes: Option<String>,
    status: QuotationStatus,
}

impl QuotationRow {
    fn into_quotation(self, line_items: Vec<LineItem>) -> Quotation {
        Quotation {
            number: self.number,
            client: self.client,
            issued_at: self.issued_at,
            line_items,
            tax_rate: TaxRate::from_bps(self.tax_bps as u32),
            notes: self.notes,
            status: self.status,
        }
    }
}

const QUOTATION_COLUMNS: &str = "number, client, issued_at, tax_bps, notes, status";

/// Repository for quotation database operations.
#[derive(Debug, Clone)]
pub struct QuotationRepository {
    pool: SqlitePool,
}

impl QuotationRepository {
    /// Creates a new QuotationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QuotationRepository { pool }
    }

    /// Gets a quotation with its lines.
    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Quotation>> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!("SELECT {} FROM quotations WHERE number = ?1", QUOTATION_COLUMNS);
        let row = sqlx::query_as::<_, QuotationRow>(&sql)
            .bind(number)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let items = lines::load_lines(&mut conn, LineTable::Quotation, number).await?;
                Ok(Some(row.into_quotation(items)))
            }
            None => Ok(None),
        }
    }

    /// Inserts or fully replaces a quotation.
    ///
    /// Returns false, writing nothing, when the stored quotation is invoiced.
    pub async fn upsert(&self, quotation: &Quotation) -> DbResult<bool> {
        debug!(
            number = %quotation.number,
            client = %quotation.client,
            lines = quotation.line_items.len(),
            "Saving quotation"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO quotations (number, client, issued_at, tax_bps, notes, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (number) DO UPDATE SET
                client = excluded.client,
                issued_at = excluded.issued_at,
                tax_bps = excluded.tax_bps,
                notes = excluded.notes,
                status = excluded.status
            WHERE quotations.status != ?7
            "#,
        )
        .bind(&quotation.number)
        .bind(&quotation.client)
        .bind(quotation.issued_at)
        .bind(quotation.tax_rate.bps() as i64)
        .bind(&quotation.notes)
        .bind(quotation.status)
        .bind(QuotationStatus::Invoiced)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            debug!(number = %quotation.number, "Quotation is invoiced, not replaced");
            return Ok(false);
        }

        lines::delete_lines(&mut tx, LineTable::Quotation, &quotation.number).await?;
        lines::insert_lines(&mut tx, LineTable::Quotation, &quotation.number, &quotation.line_items).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Lists quotations newest first.
    pub async fn list(&self) -> DbResult<Vec<Quotation>> {
        let sql = format!(
            "SELECT {} FROM quotations ORDER BY issued_at DESC, number DESC",
            QUOTATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, QuotationRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut conn = self.pool.acquire().await?;
        let mut quotations = Vec::with_capacity(rows.len());
        for row in rows {
            let items = lines::load_lines(&mut conn, LineTable::Quotation, &row.number).await?;
            quotations.push(row.into_quotation(items));
        }
        Ok(quotations)
    }

    /// Deletes a quotation and its lines.
    pub async fn delete(&self, number: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM quotations WHERE number = ?1")
            .bind(number)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of stored quotations.
    pub async fn count(&self) -> DbResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quotations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }

    /// Overwrites the status of a quotation that is not invoiced.
    pub async fn set_status(&self, number: &str, status: QuotationStatus) -> DbResult<StatusUpdate> {
        let result = sqlx::query("UPDATE quotations SET status = ?2 WHERE number = ?1 AND status != ?3")
            .bind(number)
            .bind(status)
            .bind(QuotationStatus::Invoiced)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(StatusUpdate::Updated);
        }

        // Nothing changed: either the row is gone or it is invoiced.
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM quotations WHERE number = ?1)")
            .bind(number)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists {
            StatusUpdate::AlreadyInvoiced
        } else {
            StatusUpdate::NotFound
        })
    }
}

/// Flips a pending or accepted quotation to `invoiced`.
///
/// Returns false when the quotation is missing, rejected or already
/// invoiced; the caller must then abandon its transaction.
pub(crate) async fn mark_invoiced_in(conn: &mut SqliteConnection, number: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE quotations SET status = ?2 WHERE number = ?1 AND status IN (?3, ?4)")
        .bind(number)
        .bind(QuotationStatus::Invoiced)
        .bind(QuotationStatus::Pending)
        .bind(QuotationStatus::Accepted)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use cotiza_core::{Money, Product, Quantity};

    fn quotation(number: &str, units: &[i64]) -> Quotation {
        let mut quotation = Quotation::new(number, "ACME", TaxRate::from_bps(1600));
        for (n, qty) in units.iter().enumerate() {
            let product = Product::new(
                format!("00{}", n + 1),
                format!("Producto {}", n + 1),
                Money::from_cents(1000),
                Quantity::from_units(10),
            );
            quotation.add_line_item(LineItem::new(product.snapshot(), Quantity::from_units(*qty)).unwrap());
        }
        quotation
    }

    #[tokio::test]
    async fn test_upsert_replaces_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.quotations();

        repo.upsert(&quotation("COT-1", &[1, 2, 3])).await.unwrap();
        let replacement = quotation("COT-1", &[5]);
        repo.upsert(&replacement).await.unwrap();

        let stored = repo.get_by_number("COT-1").await.unwrap().unwrap();
        assert_eq!(stored, replacement);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_status_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.quotations();
        repo.upsert(&quotation("COT-1", &[1])).await.unwrap();

        assert_eq!(
            repo.set_status("COT-1", QuotationStatus::Accepted).await.unwrap(),
            StatusUpdate::Updated
        );
        assert_eq!(
            repo.set_status("COT-9", QuotationStatus::Accepted).await.unwrap(),
            StatusUpdate::NotFound
        );

        let stored = repo.get_by_number("COT-1").await.unwrap().unwrap();
        assert_eq!(stored.status, QuotationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_mark_invoiced_only_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.quotations().upsert(&quotation("COT-1", &[1])).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(mark_invoiced_in(&mut conn, "COT-1").await.unwrap());
        assert!(!mark_invoiced_in(&mut conn, "COT-1").await.unwrap());
        assert!(!mark_invoiced_in(&mut conn, "COT-404").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_is_never_invoiced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.quotations();
        repo.upsert(&quotation("COT-1", &[1])).await.unwrap();
        repo.set_status("COT-1", QuotationStatus::Rejected).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!mark_invoiced_in(&mut conn, "COT-1").await.unwrap());
        drop(conn);

        let stored = repo.get_by_number("COT-1").await.unwrap().unwrap();
        assert_eq!(stored.status, QuotationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_writes_after_conversion_keep_invoiced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.quotations();
        let original = quotation("COT-1", &[1, 2]);
        repo.upsert(&original).await.unwrap();

        // The conversion commits after a stale caller read "pending".
        let mut conn = db.pool().acquire().await.unwrap();
        assert!(mark_invoiced_in(&mut conn, "COT-1").await.unwrap());
        drop(conn);

        assert_eq!(
            repo.set_status("COT-1", QuotationStatus::Accepted).await.unwrap(),
            StatusUpdate::AlreadyInvoiced
        );
        assert!(!repo.upsert(&quotation("COT-1", &[9])).await.unwrap());

        let stored = repo.get_by_number("COT-1").await.unwrap().unwrap();
        assert_eq!(stored.status, QuotationStatus::Invoiced);
        assert_eq!(stored.line_items, original.line_items);
    }
}
