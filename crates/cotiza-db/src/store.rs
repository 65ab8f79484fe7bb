//! # Store Trait Implementations
//!
//! Plugs [`Database`] into the billing workflow by implementing the
//! `cotiza-core` store traits on top of the repositories.
//!
//! ## Invoice Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                 │
//! │   1. INSERT invoice header ... ON CONFLICT DO NOTHING, then lines    │
//! │        └── 0 rows ─────────────────────────────► DuplicateNumber      │
//! │   2. UPDATE quotation SET status='invoiced' WHERE status!='invoiced'  │
//! │        └── 0 rows ─────────────────────────────► QuotationNotConvertible
//! │   3. per stock move: conditional decrement                            │
//! │        ├── missing ────────────────────────────► ProductMissing       │
//! │        └── too low ────────────────────────────► InsufficientStock    │
//! │  COMMIT ───────────────────────────────────────► Committed            │
//! │                                                                         │
//! │  Any early exit rolls the whole transaction back.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::{invoice, product, quotation};
use cotiza_core::store::{
    BillingStore, CommitOutcome, CommitPlan, InvoiceStore, ProductStore, QuotationStore, SettingsStore,
    StatusUpdate, StockAdjustment, StoreResult,
};
use cotiza_core::{Invoice, Product, Quantity, Quotation, QuotationStatus, Settings};

/// Maps a repository result into the store vocabulary.
fn store<T>(result: DbResult<T>, operation: &str) -> StoreResult<T> {
    result.map_err(|e| e.into_store_error(operation))
}

// =============================================================================
// ProductStore
// =============================================================================

impl ProductStore for Database {
    async fn find_product(&self, code: &str) -> StoreResult<Option<Product>> {
        store(self.products().get_by_code(code).await, "find product")
    }

    async fn upsert_product(&self, product: &Product) -> StoreResult<()> {
        store(self.products().upsert(product).await, "save product")
    }

    async fn adjust_stock(&self, code: &str, delta: Quantity) -> StoreResult<StockAdjustment> {
        store(self.products().adjust_stock(code, delta).await, "adjust stock")
    }

    async fn delete_product(&self, code: &str) -> StoreResult<bool> {
        store(self.products().delete(code).await, "delete product")
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        store(self.products().list().await, "list products")
    }

    async fn search_products(&self, term: &str) -> StoreResult<Vec<Product>> {
        store(self.products().search(term).await, "search products")
    }

    async fn count_products(&self) -> StoreResult<usize> {
        store(self.products().count().await, "count products")
    }
}

// =============================================================================
// InvoiceStore
// =============================================================================

impl InvoiceStore for Database {
    async fn find_invoice(&self, number: &str) -> StoreResult<Option<Invoice>> {
        store(self.invoices().get_by_number(number).await, "find invoice")
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<bool> {
        store(self.invoices().insert(invoice).await, "insert invoice")
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        store(self.invoices().list().await, "list invoices")
    }

    async fn delete_invoice(&self, number: &str) -> StoreResult<bool> {
        store(self.invoices().delete(number).await, "delete invoice")
    }

    async fn count_invoices(&self) -> StoreResult<usize> {
        store(self.invoices().count().await, "count invoices")
    }

    async fn search_invoices_by_client(&self, term: &str) -> StoreResult<Vec<Invoice>> {
        store(self.invoices().search_by_client(term).await, "search invoices")
    }

    async fn list_invoices_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Invoice>> {
        store(self.invoices().list_between(from, to).await, "list invoices by date")
    }
}

// =============================================================================
// QuotationStore
// =============================================================================

impl QuotationStore for Database {
    async fn find_quotation(&self, number: &str) -> StoreResult<Option<Quotation>> {
        store(self.quotations().get_by_number(number).await, "find quotation")
    }

    async fn upsert_quotation(&self, quotation: &Quotation) -> StoreResult<bool> {
        store(self.quotations().upsert(quotation).await, "save quotation")
    }

    async fn list_quotations(&self) -> StoreResult<Vec<Quotation>> {
        store(self.quotations().list().await, "list quotations")
    }

    async fn delete_quotation(&self, number: &str) -> StoreResult<bool> {
        store(self.quotations().delete(number).await, "delete quotation")
    }

    async fn count_quotations(&self) -> StoreResult<usize> {
        store(self.quotations().count().await, "count quotations")
    }

    async fn set_quotation_status(&self, number: &str, status: QuotationStatus) -> StoreResult<StatusUpdate> {
        store(self.quotations().set_status(number, status).await, "update quotation status")
    }
}

// =============================================================================
// SettingsStore
// =============================================================================

impl SettingsStore for Database {
    async fn load_settings(&self) -> StoreResult<Settings> {
        store(self.settings().load().await, "load settings")
    }

    async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        store(self.settings().save(settings).await, "save settings")
    }

    async fn advance_invoice_counter(&self) -> StoreResult<u64> {
        store(self.settings().advance_invoice_counter().await, "advance invoice counter")
    }
}

// =============================================================================
// BillingStore
// =============================================================================

impl BillingStore for Database {
    async fn commit_invoice(&self, plan: &CommitPlan) -> StoreResult<CommitOutcome> {
        store(self.commit_plan(plan).await, "commit invoice")
    }
}

impl Database {
    async fn commit_plan(&self, plan: &CommitPlan) -> DbResult<CommitOutcome> {
        let mut tx = self.pool().begin().await?;

        let outcome = apply_plan(&mut tx, plan).await?;
        if outcome.is_committed() {
            tx.commit().await?;
            info!(
                number = %plan.invoice.number,
                lines = plan.invoice.line_items.len(),
                stock_moves = plan.stock_moves.len(),
                "Invoice committed"
            );
        } else {
            tx.rollback().await?;
            debug!(number = %plan.invoice.number, outcome = ?outcome, "Invoice commit rolled back");
        }

        Ok(outcome)
    }
}

async fn apply_plan(tx: &mut Transaction<'_, Sqlite>, plan: &CommitPlan) -> DbResult<CommitOutcome> {
    if !invoice::insert_in(tx, &plan.invoice).await? {
        return Ok(CommitOutcome::DuplicateNumber);
    }

    if let Some(number) = &plan.quotation {
        if !quotation::mark_invoiced_in(tx, number).await? {
            return Ok(CommitOutcome::QuotationNotConvertible(number.clone()));
        }
    }

    for stock_move in &plan.stock_moves {
        match product::adjust_stock_in(tx, &stock_move.code, -stock_move.quantity).await? {
            StockAdjustment::Applied(_) => {}
            StockAdjustment::NotFound => {
                return Ok(CommitOutcome::ProductMissing(stock_move.code.clone()));
            }
            StockAdjustment::Insufficient { available } => {
                return Ok(CommitOutcome::InsufficientStock {
                    code: stock_move.code.clone(),
                    available,
                });
            }
        }
    }

    Ok(CommitOutcome::Committed)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use cotiza_billing::BillingService;
    use cotiza_core::document::BillingDocument;
    use cotiza_core::store::StockMove;
    use cotiza_core::{CoreError, InvoiceRequest, LineItem, Money, QuotationRequest, TaxRate};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let products = [
            Product::new("001", "Laptop Dell", Money::from_cents(85000), Quantity::from_units(10)),
            Product::new("002", "Mouse Inalámbrico", Money::from_cents(2500), Quantity::from_units(1)),
        ];
        for product in &products {
            db.upsert_product(product).await.unwrap();
        }
        db
    }

    fn plan(number: &str, moves: &[(&str, i64)]) -> CommitPlan {
        let mut invoice = Invoice::new(number, "ACME", TaxRate::zero());
        let mut stock_moves = Vec::new();
        for (code, units) in moves {
            let snapshot = Product::new(*code, "x", Money::from_cents(100), Quantity::zero()).snapshot();
            invoice.add_line_item(LineItem::new(snapshot, Quantity::from_units(*units)).unwrap());
            stock_moves.push(StockMove {
                code: code.to_string(),
                quantity: Quantity::from_units(*units),
            });
        }
        CommitPlan {
            invoice,
            stock_moves,
            quotation: None,
        }
    }

    async fn stock(db: &Database, code: &str) -> Quantity {
        db.find_product(code).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_commit_applies_everything() {
        let db = seeded().await;

        let outcome = db.commit_invoice(&plan("FAC-1", &[("001", 3)])).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Committed);
        assert_eq!(stock(&db, "001").await, Quantity::from_units(7));
        assert!(db.find_invoice("FAC-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let db = seeded().await;

        let outcome = db
            .commit_invoice(&plan("FAC-1", &[("001", 3), ("002", 2)]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::InsufficientStock {
                code: "002".to_string(),
                available: Quantity::from_units(1)
            }
        );

        assert_eq!(stock(&db, "001").await, Quantity::from_units(10));
        assert!(db.find_invoice("FAC-1").await.unwrap().is_none());
        assert_eq!(db.count_invoices().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_reports_missing_product_and_duplicate() {
        let db = seeded().await;

        let outcome = db.commit_invoice(&plan("FAC-1", &[("404", 1)])).await.unwrap();
        assert_eq!(outcome, CommitOutcome::ProductMissing("404".to_string()));

        db.commit_invoice(&plan("FAC-2", &[("001", 1)])).await.unwrap();
        let outcome = db.commit_invoice(&plan("FAC-2", &[("001", 1)])).await.unwrap();
        assert_eq!(outcome, CommitOutcome::DuplicateNumber);
        assert_eq!(stock(&db, "001").await, Quantity::from_units(9));
    }

    #[tokio::test]
    async fn test_commit_guards_quotation() {
        let db = seeded().await;
        db.upsert_quotation(&Quotation::new("COT-1", "ACME", TaxRate::zero()))
            .await
            .unwrap();

        let mut first = plan("FAC-1", &[("001", 1)]);
        first.quotation = Some("COT-1".to_string());
        assert!(db.commit_invoice(&first).await.unwrap().is_committed());

        let mut second = plan("FAC-2", &[("001", 1)]);
        second.quotation = Some("COT-1".to_string());
        assert_eq!(
            db.commit_invoice(&second).await.unwrap(),
            CommitOutcome::QuotationNotConvertible("COT-1".to_string())
        );
        assert_eq!(stock(&db, "001").await, Quantity::from_units(9));

        let stored = db.find_quotation("COT-1").await.unwrap().unwrap();
        assert_eq!(stored.status, QuotationStatus::Invoiced);
    }

    // =========================================================================
    // Billing workflow on SQLite
    // =========================================================================

    #[tokio::test]
    async fn test_workflow_invoice_on_sqlite() {
        let billing = BillingService::new(seeded().await);

        let request = InvoiceRequest::new("ACME").with_line("001", Quantity::from_units(2));
        let invoice = billing.commit_invoice(&request).await.unwrap();

        assert!(invoice.number.starts_with("FAC-"));
        assert!(invoice.number.ends_with("-0001"));
        assert_eq!(invoice.subtotal(), Money::from_cents(170000));
        assert_eq!(invoice.tax(), Money::from_cents(27200));
        assert_eq!(invoice.total(), Money::from_cents(197200));

        let stored = billing.get_invoice(&invoice.number).await.unwrap();
        assert_eq!(stored, invoice);
        assert_eq!(billing.store().load_settings().await.unwrap().last_invoice_number, 1);
    }

    #[tokio::test]
    async fn test_workflow_rejected_invoice_leaves_stock() {
        let billing = BillingService::new(seeded().await);

        let request = InvoiceRequest::new("ACME")
            .with_line("001", Quantity::from_units(1))
            .with_line("002", Quantity::from_units(5));
        let err = billing.commit_invoice(&request).await.unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { ref code, .. } if code == "002"));
        assert_eq!(stock(billing.store(), "001").await, Quantity::from_units(10));
        assert_eq!(billing.store().count_invoices().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_workflow_quotation_conversion_on_sqlite() {
        let billing = BillingService::new(seeded().await);

        let request = QuotationRequest::new("Globex")
            .with_line("001", Quantity::from_units(4))
            .with_notes("Precios válidos 15 días");
        let quotation = billing.create_quotation(&request).await.unwrap();
        assert_eq!(stock(billing.store(), "001").await, Quantity::from_units(10));

        let invoice = billing.convert_quotation(&quotation.number).await.unwrap();
        assert_eq!(invoice.client, "Globex");
        assert_eq!(
            invoice.notes.as_deref(),
            Some(format!("Basado en cotización {}. Precios válidos 15 días", quotation.number).as_str())
        );
        assert_eq!(stock(billing.store(), "001").await, Quantity::from_units(6));

        let err = billing.convert_quotation(&quotation.number).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyInvoiced(_)));
    }

    #[tokio::test]
    async fn test_status_write_after_conversion_is_refused() {
        let billing = BillingService::new(seeded().await);
        let request = QuotationRequest::new("Globex").with_line("001", Quantity::from_units(1));
        let quotation = billing.create_quotation(&request).await.unwrap();

        billing.convert_quotation(&quotation.number).await.unwrap();

        // A stale status write that reached the store after the commit.
        let update = billing
            .store()
            .set_quotation_status(&quotation.number, QuotationStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(update, StatusUpdate::AlreadyInvoiced);
        assert!(!billing.store().upsert_quotation(&quotation).await.unwrap());

        let stored = billing.get_quotation(&quotation.number).await.unwrap();
        assert_eq!(stored.status, QuotationStatus::Invoiced);
    }

    #[tokio::test]
    async fn test_workflow_rejects_oversized_quantities() {
        let billing = BillingService::new(seeded().await);
        let huge = Quantity::parse("9000000000000000").unwrap();

        let request = InvoiceRequest::new("ACME").with_line("001", huge).with_line("001", huge);
        let err = billing.commit_invoice(&request).await.unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(stock(billing.store(), "001").await, Quantity::from_units(10));
        assert_eq!(billing.store().count_invoices().await.unwrap(), 0);
        assert_eq!(billing.store().load_settings().await.unwrap().last_invoice_number, 0);
    }
}
