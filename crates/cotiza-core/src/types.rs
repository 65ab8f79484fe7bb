//! # Domain Types
//!
//! Core entity types for Cotiza.
//!
//! ## Entity Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   snapshot()   ┌─────────────────┐                │
//! │  │    Product      │ ─────────────► │ ProductSnapshot │                │
//! │  │  ─────────────  │                │  code, name,    │                │
//! │  │  code (key)     │                │  price, unit    │                │
//! │  │  stock          │                └────────┬────────┘                │
//! │  └─────────────────┘                         │ + quantity (> 0)        │
//! │                                               ▼                         │
//! │  ┌─────────────────┐                ┌─────────────────┐                │
//! │  │    TaxRate      │                │    LineItem     │                │
//! │  │  bps (u32)      │                │  frozen copy,   │                │
//! │  │  1600 = 16%     │                │  never live     │                │
//! │  └─────────────────┘                └─────────────────┘                │
//! │                                                                         │
//! │  ┌─────────────────┐                ┌─────────────────┐                │
//! │  │ QuotationStatus │                │  DocumentKind   │                │
//! │  │  Pending        │                │  Invoice        │                │
//! │  │  Accepted       │                │  Quotation      │                │
//! │  │  Rejected       │                └─────────────────┘                │
//! │  │  Invoiced ■     │  (terminal)                                        │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Products are keyed by their business `code`, documents by their `number`.
//! Neither changes once created.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::DEFAULT_UNIT;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1600 bps = 16% (the default rate), 825 bps = 8.25%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Parses a percentage such as `"16"` or `"8.25"`.
    pub fn parse_percentage(input: &str) -> Result<Self, ValidationError> {
        let bps = crate::money::parse_fixed(input.trim(), 2)
            .filter(|bps| (0..=u32::MAX as i64).contains(bps))
            .ok_or_else(|| ValidationError::invalid_format("tax", format!("'{}' is not a valid percentage", input.trim())))?;
        Ok(TaxRate(bps as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Percentage text as printed on documents: `16.0`, `8.25`, `12.5`.
    ///
    /// Whole percentages keep one decimal so they read as rates, not counts.
    pub fn percent_label(&self) -> String {
        let whole = self.0 / 100;
        let fraction = self.0 % 100;
        if fraction == 0 {
            format!("{}.0", whole)
        } else if fraction % 10 == 0 {
            format!("{}.{}", whole, fraction / 10)
        } else {
            format!("{}.{:02}", whole, fraction)
        }
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product with its current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Business identifier, unique and immutable once created.
    pub code: String,

    /// Display name printed on documents.
    pub name: String,

    /// Price per unit (never negative).
    pub unit_price: Money,

    /// Optional long description.
    pub description: Option<String>,

    /// Free-form unit label ("unidad", "kg", "hora", ...).
    pub unit: String,

    /// Quantity on hand. Never negative after a committed operation.
    pub stock: Quantity,
}

impl Product {
    /// Creates a product with the default unit and no description.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        stock: Quantity,
    ) -> Self {
        Product {
            code: code.into(),
            name: name.into(),
            unit_price,
            description: None,
            unit: DEFAULT_UNIT.to_string(),
            stock,
        }
    }

    /// Whether stock sufficiency applies when converting quotations.
    ///
    /// Only counted goods (`"unidad"`) are checked and decremented there;
    /// services and measured goods pass through.
    pub fn tracks_stock(&self) -> bool {
        self.unit == DEFAULT_UNIT
    }

    /// Checks whether `requested` can be taken from stock.
    pub fn can_supply(&self, requested: Quantity) -> bool {
        self.stock >= requested
    }

    /// Freezes the fields a document needs.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            code: self.code.clone(),
            name: self.name.clone(),
            unit_price: self.unit_price,
            unit: self.unit.clone(),
        }
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// Product fields frozen at document-build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSnapshot {
    pub code: String,
    pub name: String,
    pub unit_price: Money,
    pub unit: String,
}

impl ProductSnapshot {
    /// Same rule as [`Product::tracks_stock`], applied to the frozen unit.
    pub fn tracks_stock(&self) -> bool {
        self.unit == DEFAULT_UNIT
    }
}

/// One product/quantity pair inside an invoice or quotation.
///
/// ## Snapshot Pattern
/// The line keeps its own copy of code, name and price. Editing or deleting
/// the catalog product afterwards never changes a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product: ProductSnapshot,
    pub quantity: Quantity,
}

impl LineItem {
    /// Creates a line item, rejecting quantities that are not positive or
    /// exceed [`crate::validation::MAX_QUANTITY`].
    ///
    /// Construction is the only place the check happens, so a rejected
    /// line never reaches a document.
    pub fn new(product: ProductSnapshot, quantity: Quantity) -> Result<Self, ValidationError> {
        crate::validation::validate_quantity(quantity)?;
        Ok(LineItem { product, quantity })
    }

    /// `unit_price × quantity`, rounded to the cent.
    pub fn line_subtotal(&self) -> Money {
        self.product.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Quotation Status
// =============================================================================

/// Lifecycle state of a quotation.
///
/// ## State Machine
/// ```text
///            ┌──(external)──► Accepted ──┐
///            │                           │ conversion
///  Pending ──┼───────────────────────────┼──► Invoiced ■ terminal
///            │                conversion
///            └──(external)──► Rejected ■ (not convertible)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    /// Freshly created, waiting for the client.
    #[default]
    Pending,
    /// Client agreed to the quote.
    Accepted,
    /// Client declined the quote.
    Rejected,
    /// Converted into an invoice. Terminal.
    Invoiced,
}

impl QuotationStatus {
    /// Stable lowercase name used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Pending => "pending",
            QuotationStatus::Accepted => "accepted",
            QuotationStatus::Rejected => "rejected",
            QuotationStatus::Invoiced => "invoiced",
        }
    }

    /// Parses the stored name.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(QuotationStatus::Pending),
            "accepted" => Ok(QuotationStatus::Accepted),
            "rejected" => Ok(QuotationStatus::Rejected),
            "invoiced" => Ok(QuotationStatus::Invoiced),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["pending", "accepted", "rejected", "invoiced"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }

    /// Whether a quotation in this state may be converted.
    pub fn is_convertible(&self) -> bool {
        matches!(self, QuotationStatus::Pending | QuotationStatus::Accepted)
    }

    /// Transitions allowed through external action.
    ///
    /// `Invoiced` is never a valid target here; only the conversion
    /// workflow sets it.
    pub fn can_transition_to(&self, next: QuotationStatus) -> bool {
        matches!(
            (self, next),
            (QuotationStatus::Pending, QuotationStatus::Accepted)
                | (QuotationStatus::Pending, QuotationStatus::Rejected)
        )
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Document Kind
// =============================================================================

/// Which kind of billing document a value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Quotation,
}

impl DocumentKind {
    /// Heading printed at the top of rendered documents.
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "FACTURA",
            DocumentKind::Quotation => "COTIZACIÓN",
        }
    }

    /// Prefix of generated file names (`factura_FAC-2026-0001.pdf`).
    pub fn slug(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "factura",
            DocumentKind::Quotation => "cotizacion",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Invoice => f.write_str("Invoice"),
            DocumentKind::Quotation => f.write_str("Quotation"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn laptop() -> Product {
        Product::new("001", "Laptop Dell", Money::from_cents(85000), Quantity::from_units(10))
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(8.25);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_parse_percentage() {
        assert_eq!(TaxRate::parse_percentage("16").unwrap().bps(), 1600);
        assert_eq!(TaxRate::parse_percentage("8.25").unwrap().bps(), 825);
        assert!(TaxRate::parse_percentage("-1").is_err());
        assert!(TaxRate::parse_percentage("abc").is_err());
    }

    #[test]
    fn test_tax_rate_percent_label() {
        assert_eq!(TaxRate::from_bps(1600).percent_label(), "16.0");
        assert_eq!(TaxRate::from_bps(825).percent_label(), "8.25");
        assert_eq!(TaxRate::from_bps(1250).percent_label(), "12.5");
        assert_eq!(TaxRate::from_bps(5).percent_label(), "0.05");
    }

    #[test]
    fn test_line_item_rejects_out_of_range_quantity() {
        let snapshot = laptop().snapshot();
        assert!(LineItem::new(snapshot.clone(), Quantity::zero()).is_err());
        assert!(LineItem::new(snapshot.clone(), Quantity::from_units(-1)).is_err());
        assert!(LineItem::new(snapshot.clone(), Quantity::from_units(1_000_001)).is_err());

        let line = LineItem::new(snapshot, Quantity::from_units(3)).unwrap();
        assert_eq!(line.line_subtotal().cents(), 255000);
    }

    #[test]
    fn test_snapshot_is_detached_from_product() {
        let mut product = laptop();
        let line = LineItem::new(product.snapshot(), Quantity::from_units(1)).unwrap();

        product.unit_price = Money::from_cents(1);
        product.name = "Renamed".to_string();

        assert_eq!(line.product.unit_price.cents(), 85000);
        assert_eq!(line.product.name, "Laptop Dell");
    }

    #[test]
    fn test_tracks_stock_only_for_counted_units() {
        let mut product = laptop();
        assert!(product.tracks_stock());
        product.unit = "hora".to_string();
        assert!(!product.tracks_stock());
        assert!(!product.snapshot().tracks_stock());
    }

    #[test]
    fn test_quotation_status_transitions() {
        use QuotationStatus::*;

        assert_eq!(QuotationStatus::default(), Pending);
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Invoiced));
        assert!(!Invoiced.can_transition_to(Pending));
        assert!(!Invoiced.can_transition_to(Accepted));

        assert!(Pending.is_convertible());
        assert!(Accepted.is_convertible());
        assert!(!Rejected.is_convertible());
        assert!(!Invoiced.is_convertible());
        assert!(!Accepted.can_transition_to(Rejected));
    }

    #[test]
    fn test_quotation_status_parse() {
        assert_eq!(QuotationStatus::parse("Invoiced").unwrap(), QuotationStatus::Invoiced);
        assert_eq!(
            QuotationStatus::parse(QuotationStatus::Accepted.as_str()).unwrap(),
            QuotationStatus::Accepted
        );
        assert!(QuotationStatus::parse("archived").is_err());
    }
}
