//! # Report Commands
//!
//! Sales summary over every stored invoice, and the dashboard that adds
//! catalog counts and products at or below the low-stock threshold.
//! `--json` prints the serialized value instead of the text layout.

use cotiza_core::report::{Dashboard, SalesSummary};
use cotiza_core::store::BillingStore;
use cotiza_core::LOW_STOCK_THRESHOLD;

use crate::error::CliResult;
use crate::App;

pub async fn summary<S: BillingStore>(app: &App<S>, json: bool) -> CliResult<String> {
    let summary = app.billing().sales_summary().await?;
    if json {
        return Ok(serde_json::to_string_pretty(&summary)?);
    }
    Ok(summary_text(&summary))
}

pub async fn dashboard<S: BillingStore>(app: &App<S>, json: bool) -> CliResult<String> {
    let dashboard = app.billing().dashboard().await?;
    if json {
        return Ok(serde_json::to_string_pretty(&dashboard)?);
    }
    Ok(dashboard_text(&dashboard))
}

fn summary_text(summary: &SalesSummary) -> String {
    let mut out = String::from("Sales summary\n");
    out.push_str(&format!("  Invoices:      {}\n", summary.total_invoices));
    out.push_str(&format!("  Total sales:   {}\n", summary.total_sales));
    out.push_str(&format!("  Average sale:  {}", summary.average_sale));

    if let Some(largest) = &summary.largest {
        out.push_str(&format!("\n  Largest:       {} ({})", largest.total, largest.number));
    }
    if let Some(smallest) = &summary.smallest {
        out.push_str(&format!("\n  Smallest:      {} ({})", smallest.total, smallest.number));
    }
    out
}

fn dashboard_text(dashboard: &Dashboard) -> String {
    let mut out = summary_text(&dashboard.sales);
    out.push_str(&format!("\n\nProducts:        {}", dashboard.product_count));
    out.push_str(&format!("\nQuotations:      {}", dashboard.quotation_count));

    if dashboard.low_stock.is_empty() {
        out.push_str(&format!("\n\nNo products at or below {} units", LOW_STOCK_THRESHOLD));
    } else {
        out.push_str(&format!("\n\nLow stock (<= {}):", LOW_STOCK_THRESHOLD));
        for item in &dashboard.low_stock {
            out.push_str(&format!("\n  {:<10} {:<30} {} {}", item.code, item.name, item.stock, item.unit));
        }
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use cotiza_core::{InvoiceRequest, Quantity};

    #[tokio::test]
    async fn test_empty_summary() {
        let app = fixtures::app();

        let text = summary(&app, false).await.unwrap();
        assert!(text.contains("Invoices:      0"));
        assert!(!text.contains("Largest"));
    }

    #[tokio::test]
    async fn test_summary_after_sales() {
        let app = fixtures::app();
        let billing = app.billing();
        billing
            .commit_invoice(&InvoiceRequest::new("ACME").with_line("001", Quantity::from_units(1)))
            .await
            .unwrap();
        billing
            .commit_invoice(&InvoiceRequest::new("ACME").with_line("002", Quantity::from_units(2)))
            .await
            .unwrap();

        let text = summary(&app, false).await.unwrap();
        assert!(text.contains("Invoices:      2"));
        assert!(text.contains(&format!("Largest:       $986.00 ({})", fixtures::number("FAC", 1))));
        assert!(text.contains(&format!("Smallest:      $59.16 ({})", fixtures::number("FAC", 2))));

        let json: serde_json::Value = serde_json::from_str(&summary(&app, true).await.unwrap()).unwrap();
        assert_eq!(json["total_invoices"], 2);
    }

    #[tokio::test]
    async fn test_dashboard_lists_low_stock() {
        let app = fixtures::app();
        app.billing()
            .commit_invoice(&InvoiceRequest::new("ACME").with_line("003", Quantity::from_units(6)))
            .await
            .unwrap();

        let text = dashboard(&app, false).await.unwrap();
        assert!(text.contains("Products:        3"));
        assert!(text.contains("Low stock (<= 5):"));
        assert!(text.contains("Teclado Mecánico"));
        assert!(!text.contains("Laptop Dell"));
    }
}
