//! # cotiza-core: Pure Domain Logic for Cotiza
//!
//! This crate holds the billing and quotation domain as plain types and
//! pure functions. It performs no I/O; storage is described by traits that
//! other crates implement.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cotiza Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     apps/cli (cotiza)                           │   │
//! │  │      config, logging, argument parsing, writing output files    │   │
//! │  └───────────────┬───────────────────────────────┬─────────────────┘   │
//! │                  │                               │                      │
//! │  ┌───────────────▼───────────────┐  ┌────────────▼────────────────┐    │
//! │  │        cotiza-billing         │  │       cotiza-render         │    │
//! │  │  StockLedger, NumberSequencer │  │  paper formats, text, PDF   │    │
//! │  │  BillingService, MemoryStore  │  │  RenderEngine registry      │    │
//! │  └───────────────┬───────────────┘  └────────────┬────────────────┘    │
//! │                  │                               │                      │
//! │  ┌───────────────▼───────────────────────────────▼─────────────────┐   │
//! │  │               ★ cotiza-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   money · quantity · types · document · numbering · settings    │   │
//! │  │   request · validation · report · store (traits) · error        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO RENDERING                           │   │
//! │  └─────────────────────────────▲───────────────────────────────────┘   │
//! │                                │ implements store traits                │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │                  cotiza-db (SQLite via sqlx)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money in integer cents
//! - [`quantity`] - Fixed-point quantities (thousandths)
//! - [`types`] - Product, LineItem, TaxRate, QuotationStatus, DocumentKind
//! - [`document`] - Invoice, Quotation and derived totals
//! - [`numbering`] - Document number templates
//! - [`settings`] - Business settings and branding
//! - [`request`] - Typed caller inputs
//! - [`validation`] - Field rules
//! - [`report`] - Sales summary and dashboard
//! - [`store`] - Repository traits and the atomic commit plan
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cotiza_core::{Invoice, LineItem, Money, Product, Quantity, TaxRate};
//! use cotiza_core::document::BillingDocument;
//!
//! let laptop = Product::new("001", "Laptop Dell", Money::from_cents(85000), Quantity::from_units(10));
//! let mut invoice = Invoice::new("FAC-2026-0001", "ACME", TaxRate::from_percentage(16.0));
//! invoice.add_line_item(LineItem::new(laptop.snapshot(), Quantity::from_units(1)).unwrap());
//!
//! assert_eq!(invoice.tax().cents(), 13600);
//! assert_eq!(invoice.total().to_decimal_string(), "986.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod document;
pub mod error;
pub mod money;
pub mod numbering;
pub mod quantity;
pub mod report;
pub mod request;
pub mod settings;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use document::{BillingDocument, DocumentSummary, Invoice, Quotation};
pub use error::{CoreError, CoreResult, StoreError, ValidationError};
pub use money::Money;
pub use quantity::Quantity;
pub use request::{InvoiceRequest, LineRequest, ProductInput, QuotationRequest};
pub use settings::{Branding, Settings};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unit label of counted goods.
///
/// Products with this unit are the ones whose stock is checked and
/// decremented when a quotation is converted.
pub const DEFAULT_UNIT: &str = "unidad";

/// Products at or below this stock level show up in low-stock reports.
pub const LOW_STOCK_THRESHOLD: i64 = 5;
