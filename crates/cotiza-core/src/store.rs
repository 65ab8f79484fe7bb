//! # Store Traits
//!
//! The repository capabilities the billing workflow needs, one trait per
//! entity, plus the single atomic primitive that commits an invoice.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          BillingStore                                   │
//! │     ProductStore + InvoiceStore + QuotationStore + SettingsStore        │
//! │                    + commit_invoice(CommitPlan)                         │
//! │                                                                         │
//! │   ┌──────────────────────────┐      ┌──────────────────────────┐       │
//! │   │ cotiza-db::Database      │      │ cotiza-billing::         │       │
//! │   │ SQLite, one transaction  │      │ MemoryStore              │       │
//! │   │ per commit               │      │ one mutex per commit     │       │
//! │   └──────────────────────────┘      └──────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Outcomes vs. Errors
//! Conditions the caller must react to (stock too low, number taken,
//! quotation already invoiced) come back as values ([`StockAdjustment`],
//! [`CommitOutcome`], [`StatusUpdate`]). `Err(StoreError)` is reserved for infrastructure
//! failures.
//!
//! Method names carry the entity (`find_product`, `find_invoice`) so one
//! type can implement every trait without ambiguous calls.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::document::{Invoice, Quotation};
use crate::error::StoreError;
use crate::quantity::Quantity;
use crate::settings::Settings;
use crate::types::{Product, QuotationStatus};

/// Result type of store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Outcome Types
// =============================================================================

/// Result of a conditional stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    /// Applied; carries the new stock level.
    Applied(Quantity),
    /// No product with that code.
    NotFound,
    /// Applying the delta would leave stock negative. Nothing changed.
    Insufficient { available: Quantity },
}

/// One stock decrement inside a [`CommitPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMove {
    pub code: String,
    /// Amount taken from stock (positive).
    pub quantity: Quantity,
}

/// Everything written when an invoice is committed.
///
/// ```text
/// CommitPlan
///   ├── stock_moves     conditional decrements, in order
///   ├── invoice         inserted once
///   └── quotation       flipped to Invoiced, guarded by status != invoiced
/// ```
/// Either all of it is applied or none of it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPlan {
    pub invoice: Invoice,
    pub stock_moves: Vec<StockMove>,
    /// Number of the quotation being converted, if any.
    pub quotation: Option<String>,
}

/// Result of [`BillingStore::commit_invoice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every write was applied.
    Committed,
    /// An invoice with the same number already exists.
    DuplicateNumber,
    /// A stock move referenced a missing product.
    ProductMissing(String),
    /// A stock move would have left stock negative.
    InsufficientStock { code: String, available: Quantity },
    /// The quotation was missing or already invoiced when the guard ran.
    QuotationNotConvertible(String),
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed)
    }
}

/// Result of [`QuotationStore::set_quotation_status`].
///
/// The write is conditional on the stored status, so a conversion that
/// lands between a caller's read and its write is never undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Updated,
    NotFound,
    /// The quotation is invoiced. Nothing changed.
    AlreadyInvoiced,
}

// =============================================================================
// Entity Stores
// =============================================================================

/// Catalog products and their stock.
pub trait ProductStore: Send + Sync {
    fn find_product(&self, code: &str) -> impl Future<Output = StoreResult<Option<Product>>> + Send;

    /// Insert or fully replace by code.
    fn upsert_product(&self, product: &Product) -> impl Future<Output = StoreResult<()>> + Send;

    /// Atomically adds `delta` to the stock, refusing to go below zero.
    fn adjust_stock(
        &self,
        code: &str,
        delta: Quantity,
    ) -> impl Future<Output = StoreResult<StockAdjustment>> + Send;

    fn delete_product(&self, code: &str) -> impl Future<Output = StoreResult<bool>> + Send;

    /// All products ordered by name.
    fn list_products(&self) -> impl Future<Output = StoreResult<Vec<Product>>> + Send;

    /// Case-insensitive substring match on name or code, ordered by name.
    fn search_products(&self, term: &str) -> impl Future<Output = StoreResult<Vec<Product>>> + Send;

    fn count_products(&self) -> impl Future<Output = StoreResult<usize>> + Send;
}

/// Persisted invoices. Write-once.
pub trait InvoiceStore: Send + Sync {
    fn find_invoice(&self, number: &str) -> impl Future<Output = StoreResult<Option<Invoice>>> + Send;

    /// Inserts the invoice. Returns `false` without touching anything when
    /// the number is already stored.
    fn insert_invoice(&self, invoice: &Invoice) -> impl Future<Output = StoreResult<bool>> + Send;

    /// All invoices, newest first.
    fn list_invoices(&self) -> impl Future<Output = StoreResult<Vec<Invoice>>> + Send;

    fn delete_invoice(&self, number: &str) -> impl Future<Output = StoreResult<bool>> + Send;

    fn count_invoices(&self) -> impl Future<Output = StoreResult<usize>> + Send;

    /// Case-insensitive substring match on the client, newest first.
    fn search_invoices_by_client(
        &self,
        term: &str,
    ) -> impl Future<Output = StoreResult<Vec<Invoice>>> + Send;

    /// Invoices issued in `[from, to]`, newest first.
    fn list_invoices_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Vec<Invoice>>> + Send;
}

/// Persisted quotations.
pub trait QuotationStore: Send + Sync {
    fn find_quotation(&self, number: &str) -> impl Future<Output = StoreResult<Option<Quotation>>> + Send;

    /// Insert or fully replace by number. Returns `false`, changing
    /// nothing, when the stored quotation is already invoiced.
    fn upsert_quotation(&self, quotation: &Quotation) -> impl Future<Output = StoreResult<bool>> + Send;

    /// All quotations, newest first.
    fn list_quotations(&self) -> impl Future<Output = StoreResult<Vec<Quotation>>> + Send;

    fn delete_quotation(&self, number: &str) -> impl Future<Output = StoreResult<bool>> + Send;

    fn count_quotations(&self) -> impl Future<Output = StoreResult<usize>> + Send;

    /// Overwrites the status unless the quotation is already invoiced.
    fn set_quotation_status(
        &self,
        number: &str,
        status: QuotationStatus,
    ) -> impl Future<Output = StoreResult<StatusUpdate>> + Send;
}

/// The single settings record.
pub trait SettingsStore: Send + Sync {
    /// Current settings, or defaults when none were ever saved.
    fn load_settings(&self) -> impl Future<Output = StoreResult<Settings>> + Send;

    /// Saves everything except the invoice counter, which only
    /// [`SettingsStore::advance_invoice_counter`] moves.
    fn save_settings(&self, settings: &Settings) -> impl Future<Output = StoreResult<()>> + Send;

    /// Atomically increments the invoice counter and returns the new value.
    fn advance_invoice_counter(&self) -> impl Future<Output = StoreResult<u64>> + Send;
}

/// All entity stores plus the atomic invoice commit.
pub trait BillingStore: ProductStore + InvoiceStore + QuotationStore + SettingsStore {
    /// Applies a [`CommitPlan`] atomically.
    fn commit_invoice(&self, plan: &CommitPlan) -> impl Future<Output = StoreResult<CommitOutcome>> + Send;
}
