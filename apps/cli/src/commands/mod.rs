//! # CLI Commands
//!
//! One module per command group. Every command takes the [`App`] and
//! returns the text to print, so the same functions run against SQLite in
//! the binary and against [`MemoryStore`](cotiza_billing::MemoryStore) in
//! tests.
//!
//! | Module      | Commands                                            |
//! |-------------|-----------------------------------------------------|
//! | `product`   | products, product add / stock / delete              |
//! | `invoice`   | invoice preview / create / list / show / delete     |
//! | `quotation` | quote create / draft / list / show / status / ...   |
//! | `render`    | render, formats                                     |
//! | `report`    | report, dashboard                                   |
//! | `settings`  | settings show / set                                 |
//!
//! [`App`]: crate::App

pub mod invoice;
pub mod product;
pub mod quotation;
pub mod render;
pub mod report;
pub mod settings;

use chrono::Local;

use cotiza_core::DocumentSummary;

/// Fixed-width listing of stored documents.
pub(crate) fn document_table(rows: &[DocumentSummary]) -> String {
    if rows.is_empty() {
        return "No documents found".to_string();
    }

    let mut out = format!(
        "{:<18} {:<10} {:<28} {:>5} {:>14} {}\n",
        "NUMBER", "DATE", "CLIENT", "LINES", "TOTAL", "STATUS"
    );
    for row in rows {
        let status = row.status.map(|s| s.as_str()).unwrap_or("");
        out.push_str(&format!(
            "{:<18} {:<10} {:<28} {:>5} {:>14} {}\n",
            row.number,
            row.issued_at.with_timezone(&Local).format("%d/%m/%Y"),
            clip(&row.client, 28),
            row.line_count,
            row.total.to_string(),
            status
        ));
    }
    out.push_str(&format!("{} document(s)", rows.len()));
    out
}

/// Cuts `text` to `width` characters.
pub(crate) fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cotiza_core::{DocumentKind, Money, QuotationStatus};

    #[test]
    fn test_clip() {
        assert_eq!(clip("ACME", 10), "ACME");
        assert_eq!(clip("Comercializadora del Norte", 10), "Comercial…");
    }

    #[test]
    fn test_document_table() {
        assert_eq!(document_table(&[]), "No documents found");

        let row = DocumentSummary {
            kind: DocumentKind::Quotation,
            number: "COT-2026-0001".to_string(),
            client: "ACME".to_string(),
            issued_at: Utc::now(),
            subtotal: Money::from_cents(170000),
            tax: Money::zero(),
            total: Money::from_cents(170000),
            line_count: 1,
            status: Some(QuotationStatus::Pending),
        };
        let table = document_table(&[row]);

        assert!(table.starts_with("NUMBER"));
        assert!(table.contains("COT-2026-0001"));
        assert!(table.contains("$1700.00 pending"));
        assert!(table.ends_with("1 document(s)"));
    }
}
