//! # Stock Ledger
//!
//! Owns product stock. Every stock change goes through [`StockLedger::adjust`],
//! which relies on the store's conditional update so a decrement can never
//! leave stock negative, even when two callers race.
//!
//! ```text
//!   receive("001", 5)  ──►  adjust("001", +5)  ──►  stock 10 → 15
//!   adjust("001", -3)                          ──►  stock 15 → 12
//!   adjust("001", -20)                         ──►  InsufficientStock, stock stays 12
//! ```

use tracing::{debug, info};

use cotiza_core::report::LowStockItem;
use cotiza_core::store::{ProductStore, StockAdjustment};
use cotiza_core::validation::{validate_code, validate_quantity, validate_search_query, validate_stock_delta};
use cotiza_core::{CoreError, CoreResult, Product, ProductInput, Quantity};

/// Stock and catalog operations over a [`ProductStore`].
pub struct StockLedger<'a, S> {
    store: &'a S,
}

impl<'a, S: ProductStore> StockLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        StockLedger { store }
    }

    /// Fetches a product by code.
    pub async fn get(&self, code: &str) -> CoreResult<Product> {
        self.store
            .find_product(code)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))
    }

    /// Adds a new product. An existing code is a conflict.
    pub async fn create(&self, input: ProductInput) -> CoreResult<Product> {
        let product = input.into_product()?;

        if self.store.find_product(&product.code).await?.is_some() {
            return Err(CoreError::ProductExists(product.code));
        }

        self.store.upsert_product(&product).await?;
        info!(code = %product.code, name = %product.name, stock = %product.stock, "Product created");
        Ok(product)
    }

    /// Inserts or fully replaces a product by code.
    pub async fn upsert(&self, input: ProductInput) -> CoreResult<Product> {
        let product = input.into_product()?;
        self.store.upsert_product(&product).await?;
        debug!(code = %product.code, "Product saved");
        Ok(product)
    }

    /// Atomically adds `delta` (positive or negative) to the stock.
    ///
    /// Returns the new stock level.
    pub async fn adjust(&self, code: &str, delta: Quantity) -> CoreResult<Quantity> {
        validate_stock_delta(delta)?;
        debug!(code = %code, delta = %delta, "adjust stock");

        match self.store.adjust_stock(code, delta).await? {
            StockAdjustment::Applied(stock) => Ok(stock),
            StockAdjustment::NotFound => Err(CoreError::ProductNotFound(code.to_string())),
            StockAdjustment::Insufficient { available } => {
                let name = self
                    .store
                    .find_product(code)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_else(|| code.to_string());
                Err(CoreError::InsufficientStock {
                    code: code.to_string(),
                    name,
                    available: available.to_string(),
                    requested: (-delta).to_string(),
                })
            }
        }
    }

    /// Records incoming goods.
    pub async fn receive(&self, code: &str, quantity: Quantity) -> CoreResult<Quantity> {
        validate_quantity(quantity)?;
        let stock = self.adjust(code, quantity).await?;
        info!(code = %code, received = %quantity, stock = %stock, "Stock received");
        Ok(stock)
    }

    /// Removes a product. Returns whether it existed.
    ///
    /// Stored documents keep their snapshots.
    pub async fn delete(&self, code: &str) -> CoreResult<bool> {
        validate_code(code)?;
        let deleted = self.store.delete_product(code).await?;
        if deleted {
            info!(code = %code, "Product deleted");
        }
        Ok(deleted)
    }

    /// All products ordered by name.
    pub async fn list(&self) -> CoreResult<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    /// Case-insensitive substring search on name or code.
    pub async fn search(&self, term: &str) -> CoreResult<Vec<Product>> {
        let term = validate_search_query(term)?;
        if term.is_empty() {
            return self.list().await;
        }
        Ok(self.store.search_products(&term).await?)
    }

    /// Products whose stock is at or below `threshold`.
    pub async fn low_stock(&self, threshold: Quantity) -> CoreResult<Vec<LowStockItem>> {
        let products = self.store.list_products().await?;
        Ok(products
            .iter()
            .filter(|p| p.stock <= threshold)
            .map(LowStockItem::from)
            .collect())
    }

    /// Number of catalog products.
    pub async fn count(&self) -> CoreResult<usize> {
        Ok(self.store.count_products().await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
