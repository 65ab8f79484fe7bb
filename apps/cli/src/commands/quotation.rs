//! # Quotation Commands
//!
//! ```text
//!   quote create  ──► create_quotation (stock unchecked, nothing reserved)
//!   quote draft   ──► draft_quotation ──► text view (nothing stored)
//!   quote status  ──► pending → accepted | rejected
//!   quote convert ──► convert_quotation ──► new invoice, quote = invoiced
//! ```

use cotiza_core::store::BillingStore;
use cotiza_core::{BillingDocument, DocumentSummary, QuotationRequest, QuotationStatus};

use crate::commands::document_table;
use crate::commands::render::text_view;
use crate::error::CliResult;
use crate::App;

fn with_default_tax<S: BillingStore>(app: &App<S>, mut request: QuotationRequest) -> QuotationRequest {
    if request.tax.is_none() {
        request.tax = app.tax_override();
    }
    request
}

pub async fn create<S: BillingStore>(app: &App<S>, request: QuotationRequest) -> CliResult<String> {
    let request = with_default_tax(app, request);
    let quotation = app.billing().create_quotation(&request).await?;

    Ok(format!(
        "Quotation {} saved for {}: {} line(s), total {}",
        quotation.number,
        quotation.client,
        quotation.line_items.len(),
        quotation.displayed_total()
    ))
}

pub async fn draft<S: BillingStore>(app: &App<S>, request: QuotationRequest) -> CliResult<String> {
    let request = with_default_tax(app, request);
    let quotation = app.billing().draft_quotation(&request).await?;
    text_view(app, &quotation).await
}

pub async fn list<S: BillingStore>(app: &App<S>) -> CliResult<String> {
    let quotations = app.billing().list_quotations().await?;
    let rows: Vec<DocumentSummary> = quotations.iter().map(DocumentSummary::of_quotation).collect();
    Ok(document_table(&rows))
}

pub async fn show<S: BillingStore>(app: &App<S>, number: &str) -> CliResult<String> {
    let quotation = app.billing().get_quotation(number).await?;
    let view = text_view(app, &quotation).await?;
    Ok(format!("{}\nEstado: {}", view, quotation.status))
}

pub async fn set_status<S: BillingStore>(app: &App<S>, number: &str, status: QuotationStatus) -> CliResult<String> {
    let quotation = app.billing().set_quotation_status(number, status).await?;
    Ok(format!("Quotation {} is now {}", quotation.number, quotation.status))
}

pub async fn convert<S: BillingStore>(app: &App<S>, number: &str) -> CliResult<String> {
    let invoice = app.billing().convert_quotation(number).await?;
    Ok(format!(
        "Quotation {} converted into invoice {}: total {}",
        number,
        invoice.number,
        invoice.total()
    ))
}

pub async fn delete<S: BillingStore>(app: &App<S>, number: &str) -> CliResult<String> {
    app.billing().delete_quotation(number).await?;
    Ok(format!("Quotation {} deleted", number))
}

// =============================================================================
// Unit Tests
// =============================================================================
