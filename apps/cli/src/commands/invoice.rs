//! # Invoice Commands
//!
//! ```text
//!   invoice preview ──► preview_invoice ──► text view   (nothing stored,
//!                                                       no number used)
//!   invoice create  ──► commit_invoice  ──► one line    (stock decremented
//!                                                       atomically)
//!   invoice list    ──► search / range / all ──► table
//!   invoice show    ──► get_invoice ──► text view
//!   invoice delete  ──► delete_invoice          (stock is not restored)
//! ```

use chrono::{DateTime, Local, NaiveDate, Utc};

use cotiza_core::store::BillingStore;
use cotiza_core::{BillingDocument, DocumentSummary, Invoice, InvoiceRequest};

use crate::args::InvoiceFilter;
use crate::commands::document_table;
use crate::commands::render::text_view;
use crate::error::CliResult;
use crate::App;

fn with_default_tax<S: BillingStore>(app: &App<S>, mut request: InvoiceRequest) -> InvoiceRequest {
    if request.tax.is_none() {
        request.tax = app.tax_override();
    }
    request
}

pub async fn preview<S: BillingStore>(app: &App<S>, request: InvoiceRequest) -> CliResult<String> {
    let request = with_default_tax(app, request);
    let invoice = app.billing().preview_invoice(&request).await?;
    text_view(app, &invoice).await
}

pub async fn create<S: BillingStore>(app: &App<S>, request: InvoiceRequest) -> CliResult<String> {
    let request = with_default_tax(app, request);
    let invoice = app.billing().commit_invoice(&request).await?;

    Ok(format!(
        "Invoice {} created for {}: {} line(s), subtotal {}, tax {} ({}), total {}",
        invoice.number,
        invoice.client,
        invoice.line_items.len(),
        invoice.subtotal(),
        invoice.tax(),
        invoice.tax_rate.percent_label(),
        invoice.total()
    ))
}

pub async fn list<S: BillingStore>(app: &App<S>, filter: &InvoiceFilter) -> CliResult<String> {
    let billing = app.billing();

    let invoices = match (&filter.client, filter.from, filter.to) {
        (Some(client), _, _) => billing.search_invoices(client).await?,
        (None, Some(from), Some(to)) => match local_day_bounds(from, to) {
            Some((start, end)) => billing.invoices_between(start, end).await?,
            None => billing.list_invoices().await?,
        },
        _ => billing.list_invoices().await?,
    };

    let rows: Vec<DocumentSummary> = invoices
        .iter()
        .filter(|invoice| in_range(invoice, filter))
        .map(DocumentSummary::of_invoice)
        .collect();

    Ok(document_table(&rows))
}

pub async fn show<S: BillingStore>(app: &App<S>, number: &str) -> CliResult<String> {
    let invoice = app.billing().get_invoice(number).await?;
    text_view(app, &invoice).await
}

pub async fn delete<S: BillingStore>(app: &App<S>, number: &str) -> CliResult<String> {
    app.billing().delete_invoice(number).await?;
    Ok(format!("Invoice {} deleted (stock was not restored)", number))
}

/// First and last instant of an inclusive range of local days.
fn local_day_bounds(from: NaiveDate, to: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = from.and_hms_opt(0, 0, 0)?.and_local_timezone(Local).earliest()?;
    let end = to.and_hms_milli_opt(23, 59, 59, 999)?.and_local_timezone(Local).latest()?;
    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

fn in_range(invoice: &Invoice, filter: &InvoiceFilter) -> bool {
    let day = invoice.issued_at.with_timezone(&Local).date_naive();
    filter.from.map_or(true, |from| day >= from) && filter.to.map_or(true, |to| day <= to)
}

// =============================================================================
// Unit Tests
// =============================================================================
