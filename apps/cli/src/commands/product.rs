//! # Product Commands
//!
//! Catalog listing and stock movements through the [`StockLedger`].
//!
//! ```text
//!   products [--search TEXT] ──► ledger.search / ledger.list
//!   product add ...          ──► ledger.create   (existing code = conflict)
//!   product stock CODE ±N    ──► ledger.adjust   (atomic, never below zero)
//!   product delete CODE      ──► ledger.delete   (documents keep snapshots)
//! ```
//!
//! [`StockLedger`]: cotiza_billing::StockLedger

use tracing::debug;

use cotiza_core::store::BillingStore;
use cotiza_core::{CoreError, Product, ProductInput, Quantity};

use crate::commands::clip;
use crate::error::CliResult;
use crate::App;

pub async fn list<S: BillingStore>(app: &App<S>, search: Option<&str>) -> CliResult<String> {
    let ledger = app.billing().ledger();
    let products = match search {
        Some(term) => ledger.search(term).await?,
        None => ledger.list().await?,
    };
    debug!(count = products.len(), "Listing products");

    Ok(product_table(&products))
}

pub async fn add<S: BillingStore>(app: &App<S>, input: ProductInput) -> CliResult<String> {
    let product = app.billing().ledger().create(input).await?;
    Ok(format!(
        "Product {} '{}' added: {} per {}, stock {}",
        product.code, product.name, product.unit_price, product.unit, product.stock
    ))
}

pub async fn adjust<S: BillingStore>(app: &App<S>, code: &str, delta: Quantity) -> CliResult<String> {
    let stock = app.billing().ledger().adjust(code, delta).await?;
    Ok(format!("Stock of {} is now {}", code, stock))
}

pub async fn delete<S: BillingStore>(app: &App<S>, code: &str) -> CliResult<String> {
    if !app.billing().ledger().delete(code).await? {
        return Err(CoreError::ProductNotFound(code.to_string()).into());
    }
    Ok(format!("Product {} deleted", code))
}

fn product_table(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found".to_string();
    }

    let mut out = format!("{:<10} {:<30} {:>12} {:>10} {}\n", "CODE", "NAME", "PRICE", "STOCK", "UNIT");
    for product in products {
        out.push_str(&format!(
            "{:<10} {:<30} {:>12} {:>10} {}\n",
            product.code,
            clip(&product.name, 30),
            product.unit_price.to_string(),
            product.stock.to_string(),
            product.unit
        ));
    }
    out.push_str(&format!("{} product(s)", products.len()));
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
