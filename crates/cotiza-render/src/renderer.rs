//! # Renderer Trait and Output
//!
//! ```text
//! &dyn BillingDocument ─┐
//! &PaperFormat ─────────┼──► DocumentRenderer::render ──► RenderedDocument
//! &Settings ────────────┘                                  ├── body: Text | Binary
//!                                                          ├── filename
//!                                                          └── content_type
//! ```

use cotiza_core::document::BillingDocument;
use cotiza_core::Settings;

use crate::error::RenderResult;
use crate::paper::PaperFormat;

/// Produces one output representation of a document.
///
/// Implementations must not touch the store or the file system; the
/// caller decides where the output goes.
pub trait DocumentRenderer: Send + Sync {
    fn render(
        &self,
        doc: &dyn BillingDocument,
        paper: &PaperFormat,
        settings: &Settings,
    ) -> RenderResult<RenderedDocument>;
}

/// Rendered content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBody {
    Text(String),
    Binary(Vec<u8>),
}

impl RenderBody {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RenderBody::Text(text) => text.as_bytes(),
            RenderBody::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// A rendered document ready to be written or sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub body: RenderBody,
    /// `<factura|cotizacion>_<number>.<ext>`
    pub filename: String,
    pub content_type: &'static str,
}

impl RenderedDocument {
    /// Plain text output, `.txt`.
    pub fn text(doc: &dyn BillingDocument, text: String) -> Self {
        RenderedDocument {
            body: RenderBody::Text(text),
            filename: file_name(doc, "txt"),
            content_type: "text/plain; charset=utf-8",
        }
    }

    /// PDF output, `.pdf`.
    pub fn pdf(doc: &dyn BillingDocument, bytes: Vec<u8>) -> Self {
        RenderedDocument {
            body: RenderBody::Binary(bytes),
            filename: file_name(doc, "pdf"),
            content_type: "application/pdf",
        }
    }

    /// Text content, if this is a text rendering.
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            RenderBody::Text(text) => Some(text),
            RenderBody::Binary(_) => None,
        }
    }
}

/// Path separators in the number would otherwise escape the output
/// directory.
fn file_name(doc: &dyn BillingDocument, extension: &str) -> String {
    let number: String = doc
        .number()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();

    format!("{}_{}.{}", doc.kind().slug(), number, extension)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cotiza_core::{Invoice, Quotation, TaxRate};

    #[test]
    fn test_file_names() {
        let invoice = Invoice::new("FAC-2026-0007", "ACME", TaxRate::zero());
        let quotation = Quotation::new("COT-0003", "ACME", TaxRate::zero());

        assert_eq!(
            RenderedDocument::text(&invoice, String::new()).filename,
            "factura_FAC-2026-0007.txt"
        );
        assert_eq!(
            RenderedDocument::pdf(&quotation, Vec::new()).filename,
            "cotizacion_COT-0003.pdf"
        );
    }

    #[test]
    fn test_separators_are_replaced() {
        let invoice = Invoice::new("FAC/2026/7", "ACME", TaxRate::zero());

        let output = RenderedDocument::pdf(&invoice, vec![1, 2, 3]);
        assert_eq!(output.filename, "factura_FAC-2026-7.pdf");
        assert_eq!(output.content_type, "application/pdf");
        assert_eq!(output.body.len(), 3);
        assert!(output.as_text().is_none());
    }
}
