//! # Reports
//!
//! Aggregates computed from stored invoices and the catalog.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::document::{BillingDocument, Invoice};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::Product;

/// An invoice number together with its total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceTotal {
    pub number: String,
    pub total: Money,
}

/// Sales aggregate over a set of invoices.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub total_invoices: usize,
    pub total_sales: Money,
    /// `total_sales / total_invoices`, rounded to the cent. Zero when empty.
    pub average_sale: Money,
    pub largest: Option<InvoiceTotal>,
    pub smallest: Option<InvoiceTotal>,
}

impl SalesSummary {
    /// Aggregates the given invoices.
    ///
    /// On ties the first invoice in iteration order wins both extremes.
    pub fn from_invoices<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> Self {
        let mut summary = SalesSummary::default();

        for invoice in invoices {
            let total = invoice.total();
            summary.total_invoices += 1;
            summary.total_sales += total;

            let entry = || InvoiceTotal {
                number: invoice.number.clone(),
                total,
            };
            if summary.largest.as_ref().map_or(true, |l| total > l.total) {
                summary.largest = Some(entry());
            }
            if summary.smallest.as_ref().map_or(true, |s| total < s.total) {
                summary.smallest = Some(entry());
            }
        }

        if summary.total_invoices > 0 {
            let count = summary.total_invoices as i128;
            let sales = summary.total_sales.cents() as i128;
            let average = crate::money::div_round(sales, count);
            summary.average_sale = Money::from_cents(average as i64);
        }

        summary
    }
}

/// A product at or below the low-stock threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockItem {
    pub code: String,
    pub name: String,
    pub stock: Quantity,
    pub unit: String,
}

impl From<&Product> for LowStockItem {
    fn from(product: &Product) -> Self {
        LowStockItem {
            code: product.code.clone(),
            name: product.name.clone(),
            stock: product.stock,
            unit: product.unit.clone(),
        }
    }
}

/// Everything the overview screen shows at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Dashboard {
    pub sales: SalesSummary,
    pub product_count: usize,
    pub quotation_count: usize,
    pub low_stock: Vec<LowStockItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================
