//! # In-Memory Store
//!
//! A [`BillingStore`] kept entirely in memory behind one `tokio` mutex.
//!
//! Used as the test double of the billing workflow and for dry runs. Every
//! operation, including a whole [`CommitPlan`], runs under a single lock
//! acquisition, which gives the same all-or-nothing behaviour as the SQLite
//! transaction.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use cotiza_core::store::{
    BillingStore, CommitOutcome, CommitPlan, InvoiceStore, ProductStore, QuotationStore,
    SettingsStore, StatusUpdate, StockAdjustment, StoreResult,
};
use cotiza_core::{Invoice, Product, Quantity, Quotation, QuotationStatus, Settings};

#[derive(Debug, Default)]
struct MemoryState {
    products: BTreeMap<String, Product>,
    invoices: HashMap<String, Invoice>,
    quotations: HashMap<String, Quotation>,
    settings: Settings,
}

/// In-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Empty store with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store with the given settings.
    pub fn with_settings(settings: Settings) -> Self {
        MemoryStore {
            state: Mutex::new(MemoryState {
                settings,
                ..Default::default()
            }),
        }
    }

    /// Store pre-filled with products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .map(|p| (p.code.clone(), p))
            .collect();
        MemoryStore {
            state: Mutex::new(MemoryState {
                products,
                ..Default::default()
            }),
        }
    }
}

fn sorted_by_name(mut products: Vec<Product>) -> Vec<Product> {
    products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
    products
}

fn newest_first<T, F>(mut docs: Vec<T>, date: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    docs.sort_by(|a, b| date(b).cmp(&date(a)));
    docs
}

// =============================================================================
// ProductStore
// =============================================================================

impl ProductStore for MemoryStore {
    async fn find_product(&self, code: &str) -> StoreResult<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state.products.get(code).cloned())
    }

    async fn upsert_product(&self, product: &Product) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.products.insert(product.code.clone(), product.clone());
        Ok(())
    }

    async fn adjust_stock(&self, code: &str, delta: Quantity) -> StoreResult<StockAdjustment> {
        let mut state = self.state.lock().await;
        Ok(apply_delta(&mut state.products, code, delta))
    }

    async fn delete_product(&self, code: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state.products.remove(code).is_some())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(sorted_by_name(state.products.values().cloned().collect()))
    }

    async fn search_products(&self, term: &str) -> StoreResult<Vec<Product>> {
        let term = term.to_lowercase();
        let state = self.state.lock().await;
        let matches = state
            .products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&term) || p.code.to_lowercase().contains(&term))
            .cloned()
            .collect();
        Ok(sorted_by_name(matches))
    }

    async fn count_products(&self) -> StoreResult<usize> {
        Ok(self.state.lock().await.products.len())
    }
}

fn apply_delta(products: &mut BTreeMap<String, Product>, code: &str, delta: Quantity) -> StockAdjustment {
    match products.get_mut(code) {
        None => StockAdjustment::NotFound,
        Some(product) => {
            let next = product.stock + delta;
            if next.is_negative() {
                StockAdjustment::Insufficient {
                    available: product.stock,
                }
            } else {
                product.stock = next;
                StockAdjustment::Applied(next)
            }
        }
    }
}

// =============================================================================
// InvoiceStore
// =============================================================================

impl InvoiceStore for MemoryStore {
    async fn find_invoice(&self, number: &str) -> StoreResult<Option<Invoice>> {
        Ok(self.state.lock().await.invoices.get(number).cloned())
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        if state.invoices.contains_key(&invoice.number) {
            warn!(number = %invoice.number, "Invoice already stored, not overwriting");
            return Ok(false);
        }
        state.invoices.insert(invoice.number.clone(), invoice.clone());
        Ok(true)
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        let state = self.state.lock().await;
        Ok(newest_first(state.invoices.values().cloned().collect(), |i| i.issued_at))
    }

    async fn delete_invoice(&self, number: &str) -> StoreResult<bool> {
        Ok(self.state.lock().await.invoices.remove(number).is_some())
    }

    async fn count_invoices(&self) -> StoreResult<usize> {
        Ok(self.state.lock().await.invoices.len())
    }

    async fn search_invoices_by_client(&self, term: &str) -> StoreResult<Vec<Invoice>> {
        let term = term.to_lowercase();
        let state = self.state.lock().await;
        let matches = state
            .invoices
            .values()
            .filter(|i| i.client.to_lowercase().contains(&term))
            .cloned()
            .collect();
        Ok(newest_first(matches, |i| i.issued_at))
    }

    async fn list_invoices_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Invoice>> {
        let state = self.state.lock().await;
        let matches = state
            .invoices
            .values()
            .filter(|i| i.issued_at >= from && i.issued_at <= to)
            .cloned()
            .collect();
        Ok(newest_first(matches, |i| i.issued_at))
    }
}

// =============================================================================
// QuotationStore
// =============================================================================

impl QuotationStore for MemoryStore {
    async fn find_quotation(&self, number: &str) -> StoreResult<Option<Quotation>> {
        Ok(self.state.lock().await.quotations.get(number).cloned())
    }

    async fn upsert_quotation(&self, quotation: &Quotation) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        if is_invoiced(state.quotations.get(&quotation.number)) {
            return Ok(false);
        }
        state.quotations.insert(quotation.number.clone(), quotation.clone());
        Ok(true)
    }

    async fn list_quotations(&self) -> StoreResult<Vec<Quotation>> {
        let state = self.state.lock().await;
        Ok(newest_first(state.quotations.values().cloned().collect(), |q| q.issued_at))
    }

    async fn delete_quotation(&self, number: &str) -> StoreResult<bool> {
        Ok(self.state.lock().await.quotations.remove(number).is_some())
    }

    async fn count_quotations(&self) -> StoreResult<usize> {
        Ok(self.state.lock().await.quotations.len())
    }

    async fn set_quotation_status(&self, number: &str, status: QuotationStatus) -> StoreResult<StatusUpdate> {
        let mut state = self.state.lock().await;
        match state.quotations.get_mut(number) {
            None => Ok(StatusUpdate::NotFound),
            Some(quotation) if quotation.status == QuotationStatus::Invoiced => Ok(StatusUpdate::AlreadyInvoiced),
            Some(quotation) => {
                quotation.status = status;
                Ok(StatusUpdate::Updated)
            }
        }
    }
}

fn is_invoiced(quotation: Option<&Quotation>) -> bool {
    quotation.is_some_and(|q| q.status == QuotationStatus::Invoiced)
}

// =============================================================================
// SettingsStore
// =============================================================================

impl SettingsStore for MemoryStore {
    async fn load_settings(&self) -> StoreResult<Settings> {
        Ok(self.state.lock().await.settings.clone())
    }

    async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let counter = state.settings.last_invoice_number;
        state.settings = Settings {
            last_invoice_number: counter,
            ..settings.clone()
        };
        Ok(())
    }

    async fn advance_invoice_counter(&self) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        state.settings.last_invoice_number += 1;
        Ok(state.settings.last_invoice_number)
    }
}

// =============================================================================
// BillingStore
// =============================================================================

impl BillingStore for MemoryStore {
    async fn commit_invoice(&self, plan: &CommitPlan) -> StoreResult<CommitOutcome> {
        let mut state = self.state.lock().await;

        if state.invoices.contains_key(&plan.invoice.number) {
            return Ok(CommitOutcome::DuplicateNumber);
        }
        if let Some(number) = &plan.quotation {
            let convertible = state
                .quotations
                .get(number)
                .is_some_and(|q| q.status.is_convertible());
            if !convertible {
                return Ok(CommitOutcome::QuotationNotConvertible(number.clone()));
            }
        }

        // Work on a copy so a failing move leaves the catalog untouched.
        let mut products = state.products.clone();
        for stock_move in &plan.stock_moves {
            match apply_delta(&mut products, &stock_move.code, -stock_move.quantity) {
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

        state.products = products;
        state
            .invoices
            .insert(plan.invoice.number.clone(), plan.invoice.clone());
        if let Some(number) = &plan.quotation {
            if let Some(quotation) = state.quotations.get_mut(number) {
                quotation.status = QuotationStatus::Invoiced;
            }
        }

        debug!(number = %plan.invoice.number, moves = plan.stock_moves.len(), "Commit plan applied");
        Ok(CommitOutcome::Committed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
