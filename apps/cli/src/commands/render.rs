//! # Render Commands
//!
//! `render` writes a stored document to `COTIZA_OUTPUT_DIR` through the
//! [`RenderEngine`](cotiza_render::RenderEngine); `formats` lists what the
//! engine knows.

use std::fs;

use tracing::info;

use cotiza_core::store::BillingStore;
use cotiza_core::{BillingDocument, DocumentKind};
use cotiza_render::{RenderBody, DEFAULT_FORMAT, DEFAULT_RENDERER};

use crate::args::RenderTarget;
use crate::error::{CliError, CliResult, ErrorCode};
use crate::App;

pub async fn render<S: BillingStore>(app: &App<S>, target: &RenderTarget) -> CliResult<String> {
    let settings = app.effective_settings().await?;

    let output = match target.kind {
        DocumentKind::Invoice => {
            let invoice = app.billing().get_invoice(&target.number).await?;
            app.engine().render(&invoice, &target.renderer, &target.format, &settings)?
        }
        DocumentKind::Quotation => {
            let quotation = app.billing().get_quotation(&target.number).await?;
            app.engine().render(&quotation, &target.renderer, &target.format, &settings)?
        }
    };

    let dir = &app.config().output_dir;
    fs::create_dir_all(dir)?;
    let path = dir.join(&output.filename);
    fs::write(&path, output.body.as_bytes())?;

    info!(path = %path.display(), content_type = output.content_type, "Document written");
    Ok(format!("Wrote {} ({} bytes)", path.display(), output.body.len()))
}

/// Plain-text view of a document, for `show`, `preview` and `draft`.
pub(crate) async fn text_view<S: BillingStore>(app: &App<S>, doc: &dyn BillingDocument) -> CliResult<String> {
    let settings = app.effective_settings().await?;
    let output = app.engine().render(doc, DEFAULT_RENDERER, DEFAULT_FORMAT, &settings)?;

    match output.body {
        RenderBody::Text(text) => Ok(text),
        RenderBody::Binary(_) => Err(CliError::new(
            ErrorCode::Internal,
            format!("Renderer '{}' did not produce text", DEFAULT_RENDERER),
        )),
    }
}

pub fn formats<S: BillingStore>(app: &App<S>) -> String {
    let engine = app.engine();
    let mut out = format!("Renderers: {}\n\nPaper formats:\n", engine.renderer_names().join(", "));

    for name in engine.format_names() {
        if let Ok(paper) = engine.paper(name) {
            let profile = paper.profile();
            out.push_str(&format!(
                "  {:<12} {:>6.1} x {:<6.1} mm\n",
                name, profile.width_mm, profile.height_mm
            ));
        }
    }
    out.push_str(&format!("\nDefaults: --renderer {} --format {}", DEFAULT_RENDERER, DEFAULT_FORMAT));
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use crate::config::CliConfig;
    use cotiza_core::{InvoiceRequest, Quantity, QuotationRequest};
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cotiza-cli-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn target(kind: DocumentKind, number: &str, renderer: &str, format: &str) -> RenderTarget {
        RenderTarget {
            kind,
            number: number.to_string(),
            renderer: renderer.to_string(),
            format: format.to_string(),
        }
    }

    #[tokio::test]
    async fn test_render_writes_files() {
        let dir = temp_dir("render");
        let app = fixtures::app_with(CliConfig {
            output_dir: dir.clone(),
            company_name: Some("Papelería Sol".to_string()),
            ..CliConfig::default()
        });

        let invoice = app
            .billing()
            .commit_invoice(&InvoiceRequest::new("ACME").with_line("001", Quantity::from_units(1)))
            .await
            .unwrap();

        let output = render(&app, &target(DocumentKind::Invoice, &invoice.number, "texto", "termico"))
            .await
            .unwrap();
        let text_path = dir.join(format!("factura_{}.txt", invoice.number));
        assert!(output.starts_with(&format!("Wrote {}", text_path.display())));
        assert!(fs::read_to_string(&text_path).unwrap().contains("TOTAL:"));

        render(&app, &target(DocumentKind::Invoice, &invoice.number, "pdf", "carta"))
            .await
            .unwrap();
        let pdf = fs::read(dir.join(format!("factura_{}.pdf", invoice.number))).unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_render_quotation() {
        let dir = temp_dir("quote");
        let app = fixtures::app_with(CliConfig {
            output_dir: dir.clone(),
            ..CliConfig::default()
        });

        let quotation = app
            .billing()
            .create_quotation(&QuotationRequest::new("ACME").with_line("002", Quantity::from_units(4)))
            .await
            .unwrap();

        render(&app, &target(DocumentKind::Quotation, &quotation.number, "text", "normal"))
            .await
            .unwrap();
        let text = fs::read_to_string(dir.join(format!("cotizacion_{}.txt", quotation.number))).unwrap();
        assert!(text.contains("COTIZACIÓN"));
        assert!(!text.contains("Impuesto"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_render_errors() {
        let app = fixtures::app();

        let missing = render(&app, &target(DocumentKind::Invoice, "FAC-0000", "texto", "normal")).await;
        assert_eq!(missing.unwrap_err().code, ErrorCode::NotFound);

        app.billing()
            .commit_invoice(&InvoiceRequest::new("ACME").with_number("FAC-A1").with_line("001", Quantity::from_units(1)))
            .await
            .unwrap();
        let unknown = render(&app, &target(DocumentKind::Invoice, "FAC-A1", "html", "normal")).await;
        assert_eq!(unknown.unwrap_err().code, ErrorCode::Usage);
    }

    #[test]
    fn test_formats_listing() {
        let listing = formats(&fixtures::app());

        assert!(listing.starts_with("Renderers: pdf, text, texto"));
        assert!(listing.contains("termico"));
        assert!(listing.contains("216.0 x 279.0"));
        assert!(listing.ends_with("--renderer texto --format normal"));
    }
}
