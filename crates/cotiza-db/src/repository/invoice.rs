//! # Invoice Repository
//!
//! Invoices are write-once: a header row in `invoices` plus its lines in
//! `invoice_lines`, inserted together. There is no update.
//!
//! ## Insert
//! ```text
//! BEGIN
//!   INSERT INTO invoices ... ON CONFLICT (number) DO NOTHING
//!     │
//!     ├── 0 rows → number taken, ROLLBACK, return false
//!     └── 1 row  → INSERT each line (position 0..n)
//! COMMIT
//! ```
//! Totals are stored alongside the header so the table can be read on its
//! own; documents are always rebuilt from their lines.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::repository::lines::{self, LineTable};
use cotiza_core::document::BillingDocument;
use cotiza_core::{Invoice, TaxRate};

#[derive(Debug, FromRow)]
struct InvoiceRow {
    number: String,
    client: String,
    issued_at: DateTime<Utc>,
    tax_bps: i64,
    notes: Option<String>,
}

impl InvoiceRow {
    fn into_invoice(self, line_items: Vec<cotiza_core::LineItem>) -> Invoice {
        Invoice {
            number: self.number,
            client: self.client,
            issued_at: self.issued_at,
            line_items,
            tax_rate: TaxRate::from_bps(self.tax_bps as u32),
            notes: self.notes,
        }
    }
}

const INVOICE_COLUMNS: &str = "number, client, issued_at, tax_bps, notes";

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice with its lines.
    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!("SELECT {} FROM invoices WHERE number = ?1", INVOICE_COLUMNS);
        let row = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(number)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let items = lines::load_lines(&mut conn, LineTable::Invoice, number).await?;
                Ok(Some(row.into_invoice(items)))
            }
            None => Ok(None),
        }
    }

    /// Inserts an invoice and its lines. Returns false, writing nothing,
    /// when the number is already stored.
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        if !insert_in(&mut tx, invoice).await? {
            tx.rollback().await?;
            warn!(number = %invoice.number, "Invoice already stored, not overwriting");
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Lists invoices newest first.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {} FROM invoices ORDER BY issued_at DESC, number DESC",
            INVOICE_COLUMNS
        );
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        self.with_lines(rows).await
    }

    /// Invoices whose client contains `term`, ignoring ASCII case.
    pub async fn search_by_client(&self, term: &str) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE instr(lower(client), lower(?1)) > 0
            ORDER BY issued_at DESC, number DESC
            "#,
            INVOICE_COLUMNS
        );
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(term)
            .fetch_all(&self.pool)
            .await?;

        self.with_lines(rows).await
    }

    /// Invoices issued within `[from, to]`, newest first.
    pub async fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE issued_at >= ?1 AND issued_at <= ?2
            ORDER BY issued_at DESC, number DESC
            "#,
            INVOICE_COLUMNS
        );
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        self.with_lines(rows).await
    }

    /// Deletes an invoice; its lines go with it. Stock is not restored.
    pub async fn delete(&self, number: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM invoices WHERE number = ?1")
            .bind(number)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of stored invoices.
    pub async fn count(&self) -> DbResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }

    async fn with_lines(&self, rows: Vec<InvoiceRow>) -> DbResult<Vec<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        let mut invoices = Vec::with_capacity(rows.len());
        for row in rows {
            let items = lines::load_lines(&mut conn, LineTable::Invoice, &row.number).await?;
            invoices.push(row.into_invoice(items));
        }
        Ok(invoices)
    }
}

/// Header + lines insert on an open transaction.
///
/// Returns false without writing anything when the number is taken.
pub(crate) async fn insert_in(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<bool> {
    debug!(
        number = %invoice.number,
        client = %invoice.client,
        lines = invoice.line_items.len(),
        "Inserting invoice"
    );

    let result = sqlx::query(
        r#"
        INSERT INTO invoices (
            number, client, issued_at, tax_bps, notes,
            subtotal_cents, tax_cents, total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT (number) DO NOTHING
        "#,
    )
    .bind(&invoice.number)
    .bind(&invoice.client)
    .bind(invoice.issued_at)
    .bind(invoice.tax_rate.bps() as i64)
    .bind(&invoice.notes)
    .bind(invoice.subtotal().cents())
    .bind(invoice.tax().cents())
    .bind(invoice.total().cents())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    lines::insert_lines(conn, LineTable::Invoice, &invoice.number, &invoice.line_items).await?;
    Ok(true)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::pool::{Database, DbConfig};
    use cotiza_core::{Invoice, LineItem, Money, Product, Quantity, TaxRate};

    fn invoice(number: &str, client: &str) -> Invoice {
        let laptop = Product::new("001", "Laptop Dell", Money::from_cents(85000), Quantity::from_units(10));
        let mouse = Product::new("002", "Mouse Inalámbrico", Money::from_cents(2500), Quantity::from_units(25));

        let mut invoice = Invoice::new(number, client, TaxRate::from_bps(1600))
            .with_notes(Some("Entrega inmediata".to_string()));
        invoice.add_line_item(LineItem::new(laptop.snapshot(), Quantity::from_units(2)).unwrap());
        invoice.add_line_item(LineItem::new(mouse.snapshot(), Quantity::parse("1.5").unwrap()).unwrap());
        invoice
    }

    #[tokio::test]
    async fn test_insert_and_load_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let original = invoice("FAC-2026-0001", "ACME");

        assert!(repo.insert(&original).await.unwrap());

        let loaded = repo.get_by_number("FAC-2026-0001").await.unwrap().unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.line_items[0].product.code, "001");
        assert_eq!(loaded.line_items[1].product.code, "002");
    }

    #[tokio::test]
    async fn test_insert_is_write_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();

        assert!(repo.insert(&invoice("FAC-1", "First")).await.unwrap());
        assert!(!repo.insert(&invoice("FAC-1", "Second")).await.unwrap());

        let stored = repo.get_by_number("FAC-1").await.unwrap().unwrap();
        assert_eq!(stored.client, "First");
        assert_eq!(stored.line_items.len(), 2);
    }

    #[tokio::test]
    async fn test_list_search_and_range() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        for (n, client) in ["ACME", "Globex", "acme industrial"].iter().enumerate() {
            let mut inv = invoice(&format!("FAC-{}", n + 1), client);
            inv.issued_at = base + Duration::days(n as i64);
            repo.insert(&inv).await.unwrap();
        }

        let numbers: Vec<_> = repo.list().await.unwrap().into_iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec!["FAC-3", "FAC-2", "FAC-1"]);

        let hits: Vec<_> = repo
            .search_by_client("acme")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.number)
            .collect();
        assert_eq!(hits, vec!["FAC-3", "FAC-1"]);

        let range: Vec<_> = repo
            .list_between(base, base + Duration::days(1))
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.number)
            .collect();
        assert_eq!(range, vec!["FAC-2", "FAC-1"]);
    }

    #[tokio::test]
    async fn test_delete_cascades_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        repo.insert(&invoice("FAC-1", "ACME")).await.unwrap();

        assert!(repo.delete("FAC-1").await.unwrap());
        assert!(!repo.delete("FAC-1").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoice_lines")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
