//! # Billing Documents
//!
//! Invoices and quotations, and the totals derived from their line items.
//!
//! ## Totals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line_subtotal = unit_price × quantity      (per line, rounded)        │
//! │  subtotal      = Σ line_subtotal                                        │
//! │  tax           = subtotal × tax_rate        (rounded to the cent)       │
//! │  total         = subtotal + tax                                         │
//! │                                                                         │
//! │  Always recomputed from the lines; nothing is cached on the document.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Displayed totals
//! A quotation keeps its tax rate (it is copied onto the invoice when the
//! quotation is converted), but presents itself with zero tax and
//! `total == subtotal`. Renderers and reports go through
//! [`BillingDocument::displayed_tax`] / [`BillingDocument::displayed_total`]
//! so that rule lives in one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DocumentKind, LineItem, QuotationStatus, TaxRate};
use crate::validation::ValidationResult;

// =============================================================================
// Shared Behaviour
// =============================================================================

/// Read access shared by invoices and quotations.
///
/// Everything a renderer needs and nothing it could use to mutate.
pub trait BillingDocument {
    fn kind(&self) -> DocumentKind;
    fn number(&self) -> &str;
    fn client(&self) -> &str;
    fn issued_at(&self) -> DateTime<Utc>;
    fn line_items(&self) -> &[LineItem];
    fn tax_rate(&self) -> TaxRate;
    fn notes(&self) -> Option<&str>;

    /// Sum of line subtotals.
    fn subtotal(&self) -> Money {
        self.line_items().iter().map(LineItem::line_subtotal).sum()
    }

    /// Tax on the subtotal at the document's rate.
    fn tax(&self) -> Money {
        self.subtotal().calculate_tax(self.tax_rate())
    }

    /// Subtotal plus tax.
    fn total(&self) -> Money {
        self.subtotal() + self.tax()
    }

    /// Tax rate shown to the outside world.
    fn displayed_tax_rate(&self) -> TaxRate {
        self.tax_rate()
    }

    /// Tax amount shown to the outside world.
    fn displayed_tax(&self) -> Money {
        self.subtotal().calculate_tax(self.displayed_tax_rate())
    }

    /// Total shown to the outside world.
    fn displayed_total(&self) -> Money {
        self.subtotal() + self.displayed_tax()
    }

    fn is_empty(&self) -> bool {
        self.line_items().is_empty()
    }

    /// Subtotal plus tax, or `None` when any line, the sum or the tax
    /// leaves the `i64` cent range.
    fn checked_total(&self) -> Option<Money> {
        let lines = self
            .line_items()
            .iter()
            .map(|line| line.product.unit_price.checked_multiply_quantity(line.quantity))
            .collect::<Option<Vec<_>>>()?;
        let subtotal = Money::checked_sum(lines)?;
        subtotal.checked_add(subtotal.checked_tax(self.tax_rate())?)
    }

    /// Fails when the totals cannot be represented exactly.
    ///
    /// Run before a document is stored; the infallible accessors above
    /// clamp instead of failing.
    fn validate_totals(&self) -> ValidationResult<()> {
        match self.checked_total() {
            Some(_) => Ok(()),
            None => Err(ValidationError::invalid_format(
                "total",
                format!("{} total exceeds the largest amount that can be stored", self.kind()),
            )),
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A sale document. Persisted once, never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub number: String,
    pub client: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    pub line_items: Vec<LineItem>,
    pub tax_rate: TaxRate,
    pub notes: Option<String>,
}

impl Invoice {
    /// Creates an empty invoice issued now.
    pub fn new(number: impl Into<String>, client: impl Into<String>, tax_rate: TaxRate) -> Self {
        Invoice {
            number: number.into(),
            client: client.into(),
            issued_at: Utc::now(),
            line_items: Vec::new(),
            tax_rate,
            notes: None,
        }
    }

    /// Sets the notes, treating blank text as none.
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }

    /// Appends a line. Display order is insertion order.
    pub fn add_line_item(&mut self, item: LineItem) {
        self.line_items.push(item);
    }
}

impl BillingDocument for Invoice {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Invoice
    }

    fn number(&self) -> &str {
        &self.number
    }

    fn client(&self) -> &str {
        &self.client
    }

    fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

// =============================================================================
// Quotation
// =============================================================================

/// A price offer. Same shape as an invoice plus a lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quotation {
    pub number: String,
    pub client: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    pub line_items: Vec<LineItem>,
    pub tax_rate: TaxRate,
    pub notes: Option<String>,
    pub status: QuotationStatus,
}

impl Quotation {
    /// Creates an empty pending quotation issued now.
    pub fn new(number: impl Into<String>, client: impl Into<String>, tax_rate: TaxRate) -> Self {
        Quotation {
            number: number.into(),
            client: client.into(),
            issued_at: Utc::now(),
            line_items: Vec::new(),
            tax_rate,
            notes: None,
            status: QuotationStatus::Pending,
        }
    }

    /// Sets the notes, treating blank text as none.
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }

    /// Appends a line. Display order is insertion order.
    pub fn add_line_item(&mut self, item: LineItem) {
        self.line_items.push(item);
    }

    /// Note written on the invoice produced by converting this quotation.
    pub fn conversion_note(&self) -> String {
        format!(
            "Basado en cotización {}. {}",
            self.number,
            self.notes.as_deref().unwrap_or("")
        )
        .trim_end()
        .to_string()
    }
}

impl BillingDocument for Quotation {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Quotation
    }

    fn number(&self) -> &str {
        &self.number
    }

    fn client(&self) -> &str {
        &self.client
    }

    fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Quotations are presented untaxed.
    fn displayed_tax_rate(&self) -> TaxRate {
        TaxRate::zero()
    }
}

// =============================================================================
// Summaries
// =============================================================================

/// Compact view of a stored document, used by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentSummary {
    pub kind: DocumentKind,
    pub number: String,
    pub client: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub line_count: usize,
    pub status: Option<QuotationStatus>,
}

impl DocumentSummary {
    /// Summarises an invoice.
    pub fn of_invoice(invoice: &Invoice) -> Self {
        Self::build(invoice, None)
    }

    /// Summarises a quotation, using its displayed (untaxed) totals.
    pub fn of_quotation(quotation: &Quotation) -> Self {
        Self::build(quotation, Some(quotation.status))
    }

    fn build<D: BillingDocument>(doc: &D, status: Option<QuotationStatus>) -> Self {
        DocumentSummary {
            kind: doc.kind(),
            number: doc.number().to_string(),
            client: doc.client().to_string(),
            issued_at: doc.issued_at(),
            subtotal: doc.subtotal(),
            tax: doc.displayed_tax(),
            total: doc.displayed_total(),
            line_count: doc.line_items().len(),
            status,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use crate::types::Product;

    fn line(code: &str, price_cents: i64, qty: i64) -> LineItem {
        let product = Product::new(code, format!("Product {}", code), Money::from_cents(price_cents), Quantity::from_units(100));
        LineItem::new(product.snapshot(), Quantity::from_units(qty)).unwrap()
    }

    #[test]
    fn test_invoice_totals() {
        let mut invoice = Invoice::new("FAC-2026-0001", "ACME", TaxRate::from_percentage(16.0));
        assert!(invoice.is_empty());
        assert_eq!(invoice.total(), Money::zero());

        invoice.add_line_item(line("001", 85000, 1));
        invoice.add_line_item(line("002", 2550, 2));

        assert!(!invoice.is_empty());
        assert_eq!(invoice.subtotal().cents(), 90100);
        assert_eq!(invoice.tax().cents(), 14416);
        assert_eq!(invoice.total().cents(), 104516);
        assert_eq!(invoice.displayed_total(), invoice.total());
    }

    #[test]
    fn test_invoice_zero_tax() {
        let mut invoice = Invoice::new("FAC-2026-0002", "ACME", TaxRate::zero());
        invoice.add_line_item(line("001", 85000, 3));
        assert_eq!(invoice.total().cents(), 255000);
    }

    #[test]
    fn test_line_order_is_insertion_order() {
        let mut invoice = Invoice::new("FAC-1", "ACME", TaxRate::zero());
        invoice.add_line_item(line("003", 100, 1));
        invoice.add_line_item(line("001", 100, 1));
        let codes: Vec<_> = invoice.line_items().iter().map(|l| l.product.code.as_str()).collect();
        assert_eq!(codes, vec!["003", "001"]);
    }

    #[test]
    fn test_quotation_displays_no_tax() {
        let mut quotation = Quotation::new("COT-2026-0001", "ACME", TaxRate::from_percentage(16.0));
        quotation.add_line_item(line("001", 10000, 1));

        assert_eq!(quotation.tax().cents(), 1600);
        assert_eq!(quotation.displayed_tax(), Money::zero());
        assert_eq!(quotation.displayed_total(), quotation.subtotal());
        assert_eq!(quotation.tax_rate().bps(), 1600);

        let summary = DocumentSummary::of_quotation(&quotation);
        assert_eq!(summary.total.cents(), 10000);
        assert_eq!(summary.status, Some(QuotationStatus::Pending));
    }

    #[test]
    fn test_conversion_note() {
        let quotation = Quotation::new("COT-2026-0007", "ACME", TaxRate::zero());
        assert_eq!(quotation.conversion_note(), "Basado en cotización COT-2026-0007.");

        let quotation = quotation.with_notes(Some("Entrega en 5 días".to_string()));
        assert_eq!(
            quotation.conversion_note(),
            "Basado en cotización COT-2026-0007. Entrega en 5 días"
        );
    }

    #[test]
    fn test_validate_totals_catches_overflow() {
        use crate::validation::{MAX_PRICE, MAX_QUANTITY};

        let product = Product::new("001", "Excavadora", MAX_PRICE, Quantity::zero());
        let largest = LineItem::new(product.snapshot(), MAX_QUANTITY).unwrap();

        let mut invoice = Invoice::new("FAC-1", "ACME", TaxRate::zero());
        invoice.add_line_item(largest.clone());
        assert_eq!(invoice.checked_total(), Some(Money::from_cents(10_000_000_000_000_000)));
        assert!(invoice.validate_totals().is_ok());

        // 1000 lines of 10^16 cents pass i64::MAX (about 9.2 × 10^18)
        for _ in 1..1000 {
            invoice.add_line_item(largest.clone());
        }
        assert_eq!(invoice.checked_total(), None);
        assert!(invoice.validate_totals().is_err());

        // 500 lines fit, but not with 100% tax on top
        let mut taxed = Invoice::new("FAC-2", "ACME", TaxRate::from_bps(10000));
        for _ in 0..500 {
            taxed.add_line_item(largest.clone());
        }
        assert!(Money::checked_sum(taxed.line_items().iter().map(LineItem::line_subtotal)).is_some());
        assert!(taxed.validate_totals().is_err());
    }

    #[test]
    fn test_blank_notes_are_dropped() {
        let invoice = Invoice::new("FAC-1", "ACME", TaxRate::zero()).with_notes(Some("   ".into()));
        assert_eq!(invoice.notes(), None);
    }
}
