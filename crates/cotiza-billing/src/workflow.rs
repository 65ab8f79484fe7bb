//! # Billing Workflow
//!
//! Invoices, quotations and the conversion of one into the other.
//!
//! ## Invoice Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvoiceRequest                                                         │
//! │       │ validate fields                                                 │
//! │       ▼                                                                 │
//! │  resolve lines ── unknown code ──► ProductNotFound                      │
//! │       │        ── stock too low ─► InsufficientStock                    │
//! │       ▼                                                                 │
//! │  preview_invoice: return draft, nothing written                         │
//! │                                                                         │
//! │  commit_invoice:                                                        │
//! │       │ empty? → EmptyDocument     number taken? → DuplicateDocument    │
//! │       ▼                                                                 │
//! │  NumberSequencer::next_number(Invoice)                                  │
//! │       ▼                                                                 │
//! │  store.commit_invoice(CommitPlan)   stock moves + insert, atomic        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conversion
//! ```text
//! Quotation (Pending | Accepted)
//!       │ re-resolve every line against the current catalog
//!       │ check stock of counted ("unidad") lines only
//!       ▼
//! new invoice: same client and tax rate, current prices,
//!              note "Basado en cotización {number}. {notes}"
//!       │
//!       ▼  ONE atomic commit
//! ├── decrement stock of counted lines
//! ├── insert invoice
//! └── quotation → Invoiced   (guarded: status != invoiced)
//! ```
//! Any failure before or during the commit leaves stock, invoices and the
//! quotation status exactly as they were.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use cotiza_core::report::{Dashboard, LowStockItem, SalesSummary};
use cotiza_core::store::{BillingStore, CommitOutcome, CommitPlan, StatusUpdate, StockMove};
use cotiza_core::validation::{validate_search_query, ValidationResult};
use cotiza_core::{
    BillingDocument, CoreError, CoreResult, DocumentKind, Invoice, InvoiceRequest, LineItem, LineRequest, Product,
    Quantity, Quotation, QuotationRequest, QuotationStatus, Settings, ValidationError, LOW_STOCK_THRESHOLD,
};

use crate::ledger::StockLedger;
use crate::sequencer::NumberSequencer;

/// Which lines are checked against available stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StockPolicy {
    /// Every line (invoice preview and commit).
    AllLines,
    /// Only counted goods (quotation conversion).
    TrackedLines,
    /// No check (quotations do not reserve stock).
    Unchecked,
}

impl StockPolicy {
    fn applies_to(&self, product: &Product) -> bool {
        match self {
            StockPolicy::AllLines => true,
            StockPolicy::TrackedLines => product.tracks_stock(),
            StockPolicy::Unchecked => false,
        }
    }
}

/// A requested line matched against the catalog.
#[derive(Debug, Clone)]
struct ResolvedLine {
    product: Product,
    quantity: Quantity,
}

/// Entry point of the billing domain.
///
/// Holds the store; settings are loaded fresh for each operation.
pub struct BillingService<S> {
    store: S,
}

impl<S: BillingStore> BillingService<S> {
    pub fn new(store: S) -> Self {
        BillingService { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stock and catalog operations.
    pub fn ledger(&self) -> StockLedger<'_, S> {
        StockLedger::new(&self.store)
    }

    /// Document number allocation.
    pub fn sequencer(&self) -> NumberSequencer<'_, S> {
        NumberSequencer::new(&self.store)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Current settings snapshot.
    pub async fn settings(&self) -> CoreResult<Settings> {
        Ok(self.store.load_settings().await?)
    }

    /// Validates and saves settings. The invoice counter is not touched.
    pub async fn update_settings(&self, settings: &Settings) -> CoreResult<()> {
        settings.validate()?;
        self.store.save_settings(settings).await?;
        info!(system = %settings.system_name, "Settings updated");
        Ok(())
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// Builds the invoice a commit would produce, without side effects.
    ///
    /// The number is the request's, or the next one the sequencer would
    /// hand out.
    pub async fn preview_invoice(&self, request: &InvoiceRequest) -> CoreResult<Invoice> {
        request.validate()?;
        let lines = self.resolve_lines(&request.lines, StockPolicy::AllLines).await?;
        let settings = self.store.load_settings().await?;

        let mut invoice = build_invoice(request, &settings, &lines)?;
        invoice.number = match &request.number {
            Some(number) => number.trim().to_string(),
            None => self.sequencer().peek(DocumentKind::Invoice).await?,
        };
        debug!(number = %invoice.number, lines = invoice.line_items.len(), total = %invoice.total(), "Invoice previewed");
        Ok(invoice)
    }

    /// Validates, numbers and persists an invoice, decrementing stock for
    /// every line in the same atomic operation.
    pub async fn commit_invoice(&self, request: &InvoiceRequest) -> CoreResult<Invoice> {
        request.validate()?;
        if request.lines.is_empty() {
            return Err(CoreError::EmptyDocument(DocumentKind::Invoice.to_string()));
        }

        let lines = self.resolve_lines(&request.lines, StockPolicy::AllLines).await?;
        let settings = self.store.load_settings().await?;

        // Built before numbering so a rejected invoice never consumes a number.
        let mut invoice = build_invoice(request, &settings, &lines)?;
        invoice.number = match &request.number {
            Some(number) => {
                let number = number.trim().to_string();
                if self.store.find_invoice(&number).await?.is_some() {
                    return Err(duplicate_invoice(number));
                }
                number
            }
            None => self.sequencer().next_number(DocumentKind::Invoice).await?,
        };

        let plan = CommitPlan {
            stock_moves: stock_moves(&lines, StockPolicy::AllLines),
            invoice,
            quotation: None,
        };

        self.apply(plan, &lines).await
    }

    pub async fn get_invoice(&self, number: &str) -> CoreResult<Invoice> {
        self.store
            .find_invoice(number)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(number.to_string()))
    }

    /// All invoices, newest first.
    pub async fn list_invoices(&self) -> CoreResult<Vec<Invoice>> {
        Ok(self.store.list_invoices().await?)
    }

    /// Deletes an invoice. Stock is not restored.
    pub async fn delete_invoice(&self, number: &str) -> CoreResult<()> {
        if !self.store.delete_invoice(number).await? {
            return Err(CoreError::InvoiceNotFound(number.to_string()));
        }
        info!(number = %number, "Invoice deleted");
        Ok(())
    }

    pub async fn count_invoices(&self) -> CoreResult<usize> {
        Ok(self.store.count_invoices().await?)
    }

    /// Invoices whose client contains `term`, case-insensitive.
    pub async fn search_invoices(&self, term: &str) -> CoreResult<Vec<Invoice>> {
        let term = validate_search_query(term)?;
        Ok(self.store.search_invoices_by_client(&term).await?)
    }

    /// Invoices issued in `[from, to]`.
    pub async fn invoices_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> CoreResult<Vec<Invoice>> {
        Ok(self.store.list_invoices_between(from, to).await?)
    }

    // =========================================================================
    // Quotations
    // =========================================================================

    /// Saves a quotation.
    ///
    /// Products must exist but stock is not checked; a quotation reserves
    /// nothing. Saving over an existing number replaces it, unless that
    /// quotation was already invoiced.
    pub async fn create_quotation(&self, request: &QuotationRequest) -> CoreResult<Quotation> {
        request.validate()?;
        if request.lines.is_empty() {
            return Err(CoreError::EmptyDocument(DocumentKind::Quotation.to_string()));
        }

        let lines = self.resolve_lines(&request.lines, StockPolicy::Unchecked).await?;
        let settings = self.store.load_settings().await?;
        let mut quotation = build_quotation(request, &settings, &lines)?;

        quotation.number = match &request.number {
            Some(number) => number.trim().to_string(),
            None => self.sequencer().next_number(DocumentKind::Quotation).await?,
        };

        if let Some(existing) = self.store.find_quotation(&quotation.number).await? {
            if existing.status == QuotationStatus::Invoiced {
                return Err(CoreError::AlreadyInvoiced(quotation.number));
            }
            warn!(number = %quotation.number, "Replacing existing quotation");
        }

        // The store refuses to overwrite a quotation invoiced since the check above.
        if !self.store.upsert_quotation(&quotation).await? {
            return Err(CoreError::AlreadyInvoiced(quotation.number));
        }

        info!(
            number = %quotation.number,
            client = %quotation.client,
            lines = quotation.line_items.len(),
            "Quotation saved"
        );
        Ok(quotation)
    }

    /// Builds a quotation for rendering without saving it.
    pub async fn draft_quotation(&self, request: &QuotationRequest) -> CoreResult<Quotation> {
        request.validate()?;
        let lines = self.resolve_lines(&request.lines, StockPolicy::Unchecked).await?;
        let settings = self.store.load_settings().await?;

        let mut quotation = build_quotation(request, &settings, &lines)?;
        quotation.number = match &request.number {
            Some(number) => number.trim().to_string(),
            None => self.sequencer().peek(DocumentKind::Quotation).await?,
        };
        Ok(quotation)
    }

    /// Records the client's answer: `Pending → Accepted | Rejected`.
    pub async fn set_quotation_status(&self, number: &str, status: QuotationStatus) -> CoreResult<Quotation> {
        let mut quotation = self.get_quotation(number).await?;

        if quotation.status == QuotationStatus::Invoiced {
            return Err(CoreError::AlreadyInvoiced(number.to_string()));
        }
        if !quotation.status.can_transition_to(status) {
            return Err(CoreError::InvalidStatusTransition {
                number: number.to_string(),
                from: quotation.status.to_string(),
                to: status.to_string(),
            });
        }

        match self.store.set_quotation_status(number, status).await? {
            StatusUpdate::Updated => {}
            StatusUpdate::NotFound => return Err(CoreError::QuotationNotFound(number.to_string())),
            // Converted between the read above and the write.
            StatusUpdate::AlreadyInvoiced => return Err(CoreError::AlreadyInvoiced(number.to_string())),
        }
        info!(number = %number, from = %quotation.status, to = %status, "Quotation status changed");

        quotation.status = status;
        Ok(quotation)
    }

    /// Turns a quotation into an invoice.
    pub async fn convert_quotation(&self, number: &str) -> CoreResult<Invoice> {
        let quotation = self.get_quotation(number).await?;

        match quotation.status {
            QuotationStatus::Invoiced => return Err(CoreError::AlreadyInvoiced(number.to_string())),
            status if !status.is_convertible() => {
                return Err(CoreError::InvalidStatusTransition {
                    number: number.to_string(),
                    from: status.to_string(),
                    to: QuotationStatus::Invoiced.to_string(),
                })
            }
            _ => {}
        }
        if quotation.line_items.is_empty() {
            return Err(CoreError::EmptyDocument(DocumentKind::Quotation.to_string()));
        }

        let requested: Vec<LineRequest> = quotation
            .line_items
            .iter()
            .map(|line| LineRequest::new(line.product.code.clone(), line.quantity))
            .collect();
        let lines = self.resolve_lines(&requested, StockPolicy::TrackedLines).await?;

        let mut invoice = Invoice::new(String::new(), quotation.client.clone(), quotation.tax_rate)
            .with_notes(Some(quotation.conversion_note()));
        for line in &lines {
            invoice.add_line_item(LineItem::new(line.product.snapshot(), line.quantity)?);
        }
        invoice.validate_totals()?;
        invoice.number = self.sequencer().next_number(DocumentKind::Invoice).await?;

        let plan = CommitPlan {
            stock_moves: stock_moves(&lines, StockPolicy::TrackedLines),
            invoice,
            quotation: Some(quotation.number.clone()),
        };

        let invoice = self.apply(plan, &lines).await?;
        info!(quotation = %quotation.number, invoice = %invoice.number, "Quotation converted");
        Ok(invoice)
    }

    pub async fn get_quotation(&self, number: &str) -> CoreResult<Quotation> {
        self.store
            .find_quotation(number)
            .await?
            .ok_or_else(|| CoreError::QuotationNotFound(number.to_string()))
    }

    /// All quotations, newest first.
    pub async fn list_quotations(&self) -> CoreResult<Vec<Quotation>> {
        Ok(self.store.list_quotations().await?)
    }

    pub async fn delete_quotation(&self, number: &str) -> CoreResult<()> {
        if !self.store.delete_quotation(number).await? {
            return Err(CoreError::QuotationNotFound(number.to_string()));
        }
        info!(number = %number, "Quotation deleted");
        Ok(())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Totals over every stored invoice.
    pub async fn sales_summary(&self) -> CoreResult<SalesSummary> {
        let invoices = self.store.list_invoices().await?;
        Ok(SalesSummary::from_invoices(&invoices))
    }

    /// Sales summary, counts and low-stock products.
    pub async fn dashboard(&self) -> CoreResult<Dashboard> {
        let sales = self.sales_summary().await?;
        let low_stock: Vec<LowStockItem> = self
            .ledger()
            .low_stock(Quantity::from_units(LOW_STOCK_THRESHOLD))
            .await?;

        Ok(Dashboard {
            sales,
            product_count: self.store.count_products().await?,
            quotation_count: self.store.count_quotations().await?,
            low_stock,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Looks every line up in the catalog and checks stock under `policy`.
    ///
    /// Quantities of repeated codes are added up before the check.
    async fn resolve_lines(&self, lines: &[LineRequest], policy: StockPolicy) -> CoreResult<Vec<ResolvedLine>> {
        let mut resolved = Vec::with_capacity(lines.len());
        let mut requested: HashMap<String, Quantity> = HashMap::new();

        for line in lines {
            let code = line.code.trim();
            let product = self
                .store
                .find_product(code)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))?;

            if policy.applies_to(&product) {
                let total = requested.entry(product.code.clone()).or_default();
                *total = total.checked_add(line.quantity).ok_or_else(|| {
                    ValidationError::invalid_format("quantity", format!("total requested for {} is too large", product.code))
                })?;
                if !product.can_supply(*total) {
                    debug!(code = %product.code, available = %product.stock, requested = %total, "Stock check failed");
                    return Err(CoreError::InsufficientStock {
                        code: product.code.clone(),
                        name: product.name.clone(),
                        available: product.stock.to_string(),
                        requested: total.to_string(),
                    });
                }
            }

            resolved.push(ResolvedLine {
                product,
                quantity: line.quantity,
            });
        }

        Ok(resolved)
    }

    /// Runs the atomic commit and maps its outcome.
    async fn apply(&self, plan: CommitPlan, lines: &[ResolvedLine]) -> CoreResult<Invoice> {
        match self.store.commit_invoice(&plan).await? {
            CommitOutcome::Committed => {
                info!(
                    number = %plan.invoice.number,
                    client = %plan.invoice.client,
                    total = %plan.invoice.total(),
                    "Invoice committed"
                );
                Ok(plan.invoice)
            }
            CommitOutcome::DuplicateNumber => Err(duplicate_invoice(plan.invoice.number)),
            CommitOutcome::ProductMissing(code) => Err(CoreError::ProductNotFound(code)),
            CommitOutcome::InsufficientStock { code, available } => {
                let requested: Quantity = lines
                    .iter()
                    .filter(|l| l.product.code == code)
                    .fold(Quantity::zero(), |acc, l| acc + l.quantity);
                let name = lines
                    .iter()
                    .find(|l| l.product.code == code)
                    .map(|l| l.product.name.clone())
                    .unwrap_or_else(|| code.clone());
                Err(CoreError::InsufficientStock {
                    code,
                    name,
                    available: available.to_string(),
                    requested: requested.to_string(),
                })
            }
            CommitOutcome::QuotationNotConvertible(number) => {
                // The status changed after convert_quotation read it.
                let current = self.store.find_quotation(&number).await?;
                Err(match current {
                    None => CoreError::QuotationNotFound(number),
                    Some(q) if q.status == QuotationStatus::Invoiced => CoreError::AlreadyInvoiced(number),
                    Some(q) => CoreError::InvalidStatusTransition {
                        number,
                        from: q.status.to_string(),
                        to: QuotationStatus::Invoiced.to_string(),
                    },
                })
            }
        }
    }
}

fn duplicate_invoice(number: String) -> CoreError {
    CoreError::DuplicateDocument {
        kind: DocumentKind::Invoice.to_string(),
        number,
    }
}

fn stock_moves(lines: &[ResolvedLine], policy: StockPolicy) -> Vec<StockMove> {
    lines
        .iter()
        .filter(|l| policy.applies_to(&l.product))
        .map(|l| StockMove {
            code: l.product.code.clone(),
            quantity: l.quantity,
        })
        .collect()
}

/// Unnumbered invoice with checked totals.
fn build_invoice(request: &InvoiceRequest, settings: &Settings, lines: &[ResolvedLine]) -> ValidationResult<Invoice> {
    let mut invoice = Invoice::new(
        String::new(),
        request.client.trim(),
        request.tax.unwrap_or(settings.default_tax),
    )
    .with_notes(request.clean_notes());
    if let Some(issued_at) = request.issued_at {
        invoice.issued_at = issued_at;
    }
    for line in lines {
        invoice.add_line_item(LineItem::new(line.product.snapshot(), line.quantity)?);
    }
    invoice.validate_totals()?;
    Ok(invoice)
}

fn build_quotation(request: &QuotationRequest, settings: &Settings, lines: &[ResolvedLine]) -> ValidationResult<Quotation> {
    let mut quotation = Quotation::new(
        String::new(),
        request.client.trim(),
        request.tax.unwrap_or(settings.default_tax),
    )
    .with_notes(request.clean_notes());
    if let Some(issued_at) = request.issued_at {
        quotation.issued_at = issued_at;
    }
    for line in lines {
        quotation.add_line_item(LineItem::new(line.product.snapshot(), line.quantity)?);
    }
    quotation.validate_totals()?;
    Ok(quotation)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use cotiza_core::store::{InvoiceStore, ProductStore, QuotationStore};
    use cotiza_core::{Money, ProductInput, TaxRate};

    fn units(n: i64) -> Quantity {
        Quantity::from_units(n)
    }

    fn service() -> BillingService<MemoryStore> {
        let mut installation = Product::new("SRV", "Instalación", Money::from_cents(5000), Quantity::zero());
        installation.unit = "hora".to_string();

        BillingService::new(MemoryStore::with_products([
            Product::new("001", "Laptop Dell", Money::from_cents(85000), units(10)),
            Product::new("002", "Mouse Logitech", Money::from_cents(2550), units(20)),
            installation,
        ]))
    }

    async fn stock(service: &BillingService<MemoryStore>, code: &str) -> Quantity {
        service.ledger().get(code).await.unwrap().stock
    }

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_commit_decrements_stock() {
        let service = service();
        let request = InvoiceRequest::new("ACME")
            .with_tax(TaxRate::zero())
            .with_line("001", units(3));

        let invoice = service.commit_invoice(&request).await.unwrap();

        assert_eq!(invoice.total().to_decimal_string(), "2550.00");
        assert_eq!(stock(&service, "001").await, units(7));
        assert_eq!(service.count_invoices().await.unwrap(), 1);
        assert!(invoice.number.starts_with("FAC-"));
    }

    #[tokio::test]
    async fn test_commit_uses_default_tax() {
        let service = service();
        let request = InvoiceRequest::new("ACME").with_line("002", units(2));

        let invoice = service.commit_invoice(&request).await.unwrap();
        assert_eq!(invoice.tax_rate, TaxRate::from_bps(1600));
        assert_eq!(invoice.subtotal().cents(), 5100);
        assert_eq!(invoice.total().cents(), 5916);
    }

    #[tokio::test]
    async fn test_insufficient_stock_aborts_everything() {
        let service = service();
        let request = InvoiceRequest::new("ACME")
            .with_line("002", units(1))
            .with_line("001", units(15));

        let err = service.commit_invoice(&request).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { ref code, .. } if code == "001"));

        assert_eq!(stock(&service, "001").await, units(10));
        assert_eq!(stock(&service, "002").await, units(20));
        assert_eq!(service.count_invoices().await.unwrap(), 0);
        // No number was consumed by the failed attempt.
        assert_eq!(service.settings().await.unwrap().last_invoice_number, 0);
    }

    #[tokio::test]
    async fn test_repeated_codes_are_checked_together() {
        let service = service();
        let request = InvoiceRequest::new("ACME")
            .with_line("001", units(6))
            .with_line("001", units(6));

        let err = service.commit_invoice(&request).await.unwrap_err();
        match err {
            CoreError::InsufficientStock { requested, .. } => assert_eq!(requested, "12.00"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock(&service, "001").await, units(10));
    }

    #[tokio::test]
    async fn test_every_line_checked_on_commit() {
        let service = service();
        let request = InvoiceRequest::new("ACME").with_line("SRV", units(2));

        // Services have no stock, and the commit path checks every line.
        let err = service.commit_invoice(&request).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
    }

    #[tokio::test]
    async fn test_preview_never_mutates() {
        let service = service();
        let request = InvoiceRequest::new("ACME").with_line("001", units(3));

        let preview = service.preview_invoice(&request).await.unwrap();
        assert_eq!(preview.line_items.len(), 1);
        assert_eq!(preview.line_items[0].product.name, "Laptop Dell");

        assert_eq!(stock(&service, "001").await, units(10));
        assert_eq!(service.count_invoices().await.unwrap(), 0);
        assert_eq!(service.settings().await.unwrap().last_invoice_number, 0);

        let committed = service.commit_invoice(&request).await.unwrap();
        assert_eq!(preview.number, committed.number);
    }

    #[tokio::test]
    async fn test_preview_reports_unknown_and_short_lines() {
        let service = service();

        let request = InvoiceRequest::new("ACME").with_line("999", units(1));
        assert!(matches!(
            service.preview_invoice(&request).await.unwrap_err(),
            CoreError::ProductNotFound(_)
        ));

        let request = InvoiceRequest::new("ACME").with_line("001", units(11));
        assert!(matches!(
            service.preview_invoice(&request).await.unwrap_err(),
            CoreError::InsufficientStock { .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_invoice_rejected() {
        let service = service();
        let err = service.commit_invoice(&InvoiceRequest::new("ACME")).await.unwrap_err();
        assert!(matches!(err, CoreError::EmptyDocument(_)));
        assert_eq!(service.count_invoices().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_explicit_duplicate_number_rejected() {
        let service = service();
        let request = InvoiceRequest::new("ACME")
            .with_number("FAC-MANUAL-1")
            .with_line("001", units(1));

        service.commit_invoice(&request).await.unwrap();
        let err = service.commit_invoice(&request).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(stock(&service, "001").await, units(9));
    }

    #[tokio::test]
    async fn test_invoice_queries() {
        let service = service();
        let mut first = InvoiceRequest::new("Juan Pérez").with_line("002", units(1));
        first.issued_at = Some(Utc::now() - chrono::Duration::days(10));
        let second = InvoiceRequest::new("ACME S.A.").with_line("002", units(1));

        let old = service.commit_invoice(&first).await.unwrap();
        let new = service.commit_invoice(&second).await.unwrap();

        let listed: Vec<_> = service.list_invoices().await.unwrap().into_iter().map(|i| i.number).collect();
        assert_eq!(listed, vec![new.number.clone(), old.number.clone()]);

        let found = service.search_invoices("juan").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].number, old.number);

        let recent = service
            .invoices_between(Utc::now() - chrono::Duration::days(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);

        service.delete_invoice(&old.number).await.unwrap();
        assert!(matches!(
            service.get_invoice(&old.number).await.unwrap_err(),
            CoreError::InvoiceNotFound(_)
        ));
        assert!(service.delete_invoice(&old.number).await.is_err());
    }

    #[tokio::test]
    async fn test_snapshot_survives_catalog_change() {
        let service = service();
        let invoice = service
            .commit_invoice(&InvoiceRequest::new("ACME").with_line("001", units(1)))
            .await
            .unwrap();

        service
            .ledger()
            .upsert(ProductInput::new("001", "Laptop Nueva", Money::from_cents(1), units(9)))
            .await
            .unwrap();

        let stored = service.get_invoice(&invoice.number).await.unwrap();
        assert_eq!(stored.line_items[0].product.name, "Laptop Dell");
        assert_eq!(stored.line_items[0].product.unit_price.cents(), 85000);
    }

    // -------------------------------------------------------------------------
    // Quotations
    // -------------------------------------------------------------------------

    async fn quote(service: &BillingService<MemoryStore>, lines: &[(&str, i64)]) -> Quotation {
        let mut request = QuotationRequest::new("ACME").with_notes("Entrega inmediata");
        for (code, qty) in lines {
            request = request.with_line(*code, units(*qty));
        }
        service.create_quotation(&request).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_quotation_does_not_check_stock() {
        let service = service();
        let quotation = quote(&service, &[("001", 50)]).await;

        assert_eq!(quotation.status, QuotationStatus::Pending);
        assert!(quotation.number.starts_with("COT-"));
        assert_eq!(quotation.tax_rate, TaxRate::from_bps(1600));
        assert_eq!(quotation.displayed_total(), quotation.subtotal());
        assert_eq!(stock(&service, "001").await, units(10));
    }

    #[tokio::test]
    async fn test_create_quotation_unknown_product() {
        let service = service();
        let request = QuotationRequest::new("ACME").with_line("999", units(1));
        assert!(matches!(
            service.create_quotation(&request).await.unwrap_err(),
            CoreError::ProductNotFound(_)
        ));
        assert!(matches!(
            service.create_quotation(&QuotationRequest::new("ACME")).await.unwrap_err(),
            CoreError::EmptyDocument(_)
        ));
    }

    #[tokio::test]
    async fn test_draft_quotation_is_not_saved() {
        let service = service();
        let request = QuotationRequest::new("ACME").with_line("002", units(4));

        let draft = service.draft_quotation(&request).await.unwrap();
        assert_eq!(draft.line_items.len(), 1);
        assert_eq!(service.list_quotations().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_convert_quotation() {
        let service = service();
        let quotation = quote(&service, &[("001", 2), ("002", 3)]).await;

        let invoice = service.convert_quotation(&quotation.number).await.unwrap();

        assert_eq!(invoice.client, "ACME");
        assert_eq!(invoice.tax_rate, quotation.tax_rate);
        assert_eq!(
            invoice.notes.as_deref(),
            Some(format!("Basado en cotización {}. Entrega inmediata", quotation.number).as_str())
        );
        assert_eq!(invoice.subtotal(), quotation.subtotal());
        assert_eq!(invoice.total().cents(), invoice.subtotal().cents() * 116 / 100);

        assert_eq!(stock(&service, "001").await, units(8));
        assert_eq!(stock(&service, "002").await, units(17));
        let stored = service.get_quotation(&quotation.number).await.unwrap();
        assert_eq!(stored.status, QuotationStatus::Invoiced);

        // Second conversion is a conflict and changes nothing.
        let err = service.convert_quotation(&quotation.number).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyInvoiced(_)));
        assert!(err.is_conflict());
        assert_eq!(stock(&service, "001").await, units(8));
        assert_eq!(service.count_invoices().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_convert_uses_current_catalog_prices() {
        let service = service();
        let quotation = quote(&service, &[("002", 1)]).await;

        service
            .ledger()
            .upsert(ProductInput::new("002", "Mouse Logitech", Money::from_cents(3000), units(20)))
            .await
            .unwrap();

        let invoice = service.convert_quotation(&quotation.number).await.unwrap();
        assert_eq!(invoice.line_items[0].product.unit_price.cents(), 3000);
    }

    #[tokio::test]
    async fn test_failed_conversion_has_no_side_effects() {
        let service = service();
        let quotation = quote(&service, &[("002", 1), ("001", 11)]).await;

        let err = service.convert_quotation(&quotation.number).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));

        assert_eq!(stock(&service, "001").await, units(10));
        assert_eq!(stock(&service, "002").await, units(20));
        assert_eq!(service.count_invoices().await.unwrap(), 0);
        assert_eq!(
            service.get_quotation(&quotation.number).await.unwrap().status,
            QuotationStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_convert_skips_untracked_lines() {
        let service = service();
        let quotation = quote(&service, &[("SRV", 3), ("002", 1)]).await;

        let invoice = service.convert_quotation(&quotation.number).await.unwrap();
        assert_eq!(invoice.line_items.len(), 2);
        assert_eq!(stock(&service, "SRV").await, Quantity::zero());
        assert_eq!(stock(&service, "002").await, units(19));
    }

    #[tokio::test]
    async fn test_convert_vanished_product() {
        let service = service();
        let quotation = quote(&service, &[("002", 1)]).await;
        service.ledger().delete("002").await.unwrap();

        let err = service.convert_quotation(&quotation.number).await.unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
        assert_eq!(
            service.get_quotation(&quotation.number).await.unwrap().status,
            QuotationStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_convert_missing_and_rejected() {
        let service = service();
        assert!(matches!(
            service.convert_quotation("COT-NOPE").await.unwrap_err(),
            CoreError::QuotationNotFound(_)
        ));

        let quotation = quote(&service, &[("002", 1)]).await;
        service
            .set_quotation_status(&quotation.number, QuotationStatus::Rejected)
            .await
            .unwrap();
        let err = service.convert_quotation(&quotation.number).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatusTransition { .. }));
    }

    #[tokio::test]
    async fn test_accepted_quotation_converts() {
        let service = service();
        let quotation = quote(&service, &[("002", 1)]).await;
        let accepted = service
            .set_quotation_status(&quotation.number, QuotationStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.status, QuotationStatus::Accepted);

        service.convert_quotation(&quotation.number).await.unwrap();
    }

    #[tokio::test]
    async fn test_status_rules() {
        let service = service();
        let quotation = quote(&service, &[("002", 1)]).await;

        let err = service
            .set_quotation_status(&quotation.number, QuotationStatus::Invoiced)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatusTransition { .. }));

        service.convert_quotation(&quotation.number).await.unwrap();
        let err = service
            .set_quotation_status(&quotation.number, QuotationStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyInvoiced(_)));
    }

    #[tokio::test]
    async fn test_invoiced_quotation_not_overwritten() {
        let service = service();
        let quotation = quote(&service, &[("002", 1)]).await;
        service.convert_quotation(&quotation.number).await.unwrap();

        let request = QuotationRequest::new("Otro")
            .with_number(quotation.number.clone())
            .with_line("001", units(1));
        let err = service.create_quotation(&request).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyInvoiced(_)));
        assert_eq!(service.get_quotation(&quotation.number).await.unwrap().client, "ACME");
    }

    #[tokio::test]
    async fn test_commit_guard_on_quotation_race() {
        // A plan whose quotation was invoiced meanwhile must not apply.
        let service = service();
        let quotation = quote(&service, &[("002", 1)]).await;
        service
            .store()
            .set_quotation_status(&quotation.number, QuotationStatus::Invoiced)
            .await
            .unwrap();

        let mut invoice = Invoice::new("FAC-RACE", "ACME", TaxRate::zero());
        let mouse = service.store().find_product("002").await.unwrap().unwrap();
        invoice.add_line_item(LineItem::new(mouse.snapshot(), units(1)).unwrap());
        let plan = CommitPlan {
            invoice,
            stock_moves: vec![StockMove {
                code: "002".to_string(),
                quantity: units(1),
            }],
            quotation: Some(quotation.number.clone()),
        };

        let outcome = service.store().commit_invoice(&plan).await.unwrap();
        assert_eq!(outcome, CommitOutcome::QuotationNotConvertible(quotation.number));
        assert!(service.store().find_invoice("FAC-RACE").await.unwrap().is_none());
        assert_eq!(stock(&service, "002").await, units(20));
    }

    #[tokio::test]
    async fn test_refused_conversion_is_explained() {
        let service = service();
        let quotation = quote(&service, &[("002", 1)]).await;
        let mouse = service.store().find_product("002").await.unwrap().unwrap();
        let plan = |number: &str| {
            let mut invoice = Invoice::new(number, "ACME", TaxRate::zero());
            invoice.add_line_item(LineItem::new(mouse.snapshot(), units(1)).unwrap());
            CommitPlan {
                invoice,
                stock_moves: Vec::new(),
                quotation: Some(quotation.number.clone()),
            }
        };

        // Rejected by someone else after the conversion read "pending".
        service
            .store()
            .set_quotation_status(&quotation.number, QuotationStatus::Rejected)
            .await
            .unwrap();
        let err = service.apply(plan("FAC-R1"), &[]).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatusTransition { ref from, .. } if from == "rejected"));

        service.store().delete_quotation(&quotation.number).await.unwrap();
        let err = service.apply(plan("FAC-R2"), &[]).await.unwrap_err();
        assert!(matches!(err, CoreError::QuotationNotFound(_)));
        assert_eq!(service.count_invoices().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stale_status_write_after_conversion() {
        let service = service();
        let quotation = quote(&service, &[("002", 1)]).await;
        service.convert_quotation(&quotation.number).await.unwrap();

        // What a status change that read "pending" before the commit sends.
        let update = service
            .store()
            .set_quotation_status(&quotation.number, QuotationStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(update, StatusUpdate::AlreadyInvoiced);
        assert!(!service.store().upsert_quotation(&quotation).await.unwrap());

        let stored = service.get_quotation(&quotation.number).await.unwrap();
        assert_eq!(stored.status, QuotationStatus::Invoiced);
    }

    // -------------------------------------------------------------------------
    // Limits
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_huge_repeated_lines_are_rejected() {
        let huge = Quantity::parse("9000000000000000").unwrap();
        let service = BillingService::new(MemoryStore::with_products([Product::new(
            "001",
            "Laptop Dell",
            Money::from_cents(85000),
            huge,
        )]));
        let request = InvoiceRequest::new("ACME").with_line("001", huge).with_line("001", huge);

        let err = service.preview_invoice(&request).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = service.commit_invoice(&request).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(stock(&service, "001").await, huge);
        assert_eq!(service.count_invoices().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_total_overflow_is_rejected_before_numbering() {
        use cotiza_core::validation::{MAX_PRICE, MAX_QUANTITY, MAX_STOCK};

        let service = BillingService::new(MemoryStore::with_products([Product::new(
            "EXC",
            "Excavadora",
            MAX_PRICE,
            MAX_STOCK,
        )]));

        // Each line is valid; together they pass i64::MAX cents.
        let mut request = InvoiceRequest::new("ACME").with_tax(TaxRate::zero());
        for _ in 0..1000 {
            request = request.with_line("EXC", MAX_QUANTITY);
        }

        let err = service.commit_invoice(&request).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(stock(&service, "EXC").await, MAX_STOCK);
        assert_eq!(service.count_invoices().await.unwrap(), 0);
        assert_eq!(service.settings().await.unwrap().last_invoice_number, 0);

        let mut quotation_request = QuotationRequest::new("ACME");
        for _ in 0..1000 {
            quotation_request = quotation_request.with_line("EXC", MAX_QUANTITY);
        }
        assert!(matches!(
            service.create_quotation(&quotation_request).await.unwrap_err(),
            CoreError::Validation(_)
        ));
        assert_eq!(service.store().count_quotations().await.unwrap(), 0);

        // A single maximal line is fine.
        let single = InvoiceRequest::new("ACME")
            .with_tax(TaxRate::zero())
            .with_line("EXC", MAX_QUANTITY);
        let invoice = service.commit_invoice(&single).await.unwrap();
        assert_eq!(invoice.total().cents(), 10_000_000_000_000_000);
    }

    #[tokio::test]
    async fn test_delete_quotation() {
        let service = service();
        let quotation = quote(&service, &[("002", 1)]).await;
        service.delete_quotation(&quotation.number).await.unwrap();
        assert!(service.delete_quotation(&quotation.number).await.is_err());
        assert_eq!(service.store().count_quotations().await.unwrap(), 0);
    }

    // -------------------------------------------------------------------------
    // Settings and reports
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_update_settings_validates() {
        let service = service();
        let mut settings = service.settings().await.unwrap();
        settings.number_template = "{prefix}".to_string();
        assert!(service.update_settings(&settings).await.is_err());

        settings.number_template = "{prefix}/{number:05}".to_string();
        service.update_settings(&settings).await.unwrap();

        let invoice = service
            .commit_invoice(&InvoiceRequest::new("ACME").with_line("002", units(1)))
            .await
            .unwrap();
        assert_eq!(invoice.number, "FAC/00001");
    }

    #[tokio::test]
    async fn test_dashboard() {
        let service = service();
        service
            .commit_invoice(&InvoiceRequest::new("A").with_tax(TaxRate::zero()).with_line("001", units(6)))
            .await
            .unwrap();
        service
            .commit_invoice(&InvoiceRequest::new("B").with_tax(TaxRate::zero()).with_line("002", units(2)))
            .await
            .unwrap();
        quote(&service, &[("002", 1)]).await;

        let dashboard = service.dashboard().await.unwrap();
        assert_eq!(dashboard.sales.total_invoices, 2);
        assert_eq!(dashboard.sales.total_sales.cents(), 510000 + 5100);
        assert_eq!(dashboard.sales.largest.unwrap().total.cents(), 510000);
        assert_eq!(dashboard.sales.smallest.unwrap().total.cents(), 5100);
        assert_eq!(dashboard.product_count, 3);
        assert_eq!(dashboard.quotation_count, 1);

        // Laptop at 4 and the service at 0 are low.
        let low: Vec<_> = dashboard.low_stock.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(low, vec!["SRV", "001"]);
    }
}
