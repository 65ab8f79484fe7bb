//! # Plain Text Renderer
//!
//! Monospaced layout for terminals and receipt printers. One character is
//! assumed to be 2 mm wide, so the line width follows the paper format.
//!
//! ```text
//! ==========================================================================
//!                                  FACTURA
//! ==========================================================================
//!
//! Número: FAC-2026-0001
//! Fecha: 14/03/2026 10:21:07
//! Cliente: ACME
//! --------------------------------------------------------------------------
//! Código     Descripción                       Cant.       Precio        Total
//! --------------------------------------------------------------------------
//! 001        Laptop Dell                        2.00 $     850.00 $    1700.00
//! --------------------------------------------------------------------------
//!                                                      Subtotal: $    1700.00
//!                                             Impuesto (16.0%): $     272.00
//! ==========================================================================
//!                                                         TOTAL: $    1972.00
//! ==========================================================================
//! ```

use cotiza_core::document::BillingDocument;
use cotiza_core::{LineItem, Money, Settings};

use crate::error::RenderResult;
use crate::format::{date_time, truncate, wrap};
use crate::paper::PaperFormat;
use crate::renderer::{DocumentRenderer, RenderedDocument};

/// Narrowest line ever produced, whatever the paper says. Below this the
/// column floors would push table rows past the separators.
const MIN_LINE_CHARS: usize = Columns::MINIMUM.width();

/// Column widths in characters. Columns are separated by one space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    code: usize,
    description: usize,
    quantity: usize,
    price: usize,
    total: usize,
}

impl Columns {
    const CANONICAL: Columns = Columns {
        code: 10,
        description: 30,
        quantity: 8,
        price: 12,
        total: 12,
    };

    /// Floor for every column on narrow paper.
    const MINIMUM: Columns = Columns {
        code: 4,
        description: 6,
        quantity: 5,
        price: 8,
        total: 8,
    };

    /// Canonical widths when they fit in `chars`, otherwise scaled down
    /// with a floor per column. The description takes whatever is left.
    fn for_line(chars: usize) -> Self {
        if chars >= Self::CANONICAL.width() {
            return Self::CANONICAL;
        }

        let available = chars.saturating_sub(4);
        let code = (available * 10 / 72).max(Self::MINIMUM.code);
        let quantity = (available * 8 / 72).max(Self::MINIMUM.quantity);
        let price = (available * 12 / 72).max(Self::MINIMUM.price);
        let total = price;
        let description = available
            .saturating_sub(code + quantity + price + total)
            .max(Self::MINIMUM.description);

        Columns {
            code,
            description,
            quantity,
            price,
            total,
        }
    }

    const fn width(&self) -> usize {
        self.code + self.description + self.quantity + self.price + self.total + 4
    }

    fn header(&self) -> String {
        format!(
            "{:<cw$} {:<dw$} {:>qw$} {:>pw$} {:>tw$}",
            label("Código", "Cód.", self.code),
            label("Descripción", "Desc.", self.description),
            label("Cant.", "Cant", self.quantity),
            label("Precio", "P.U.", self.price),
            label("Total", "Tot.", self.total),
            cw = self.code,
            dw = self.description,
            qw = self.quantity,
            pw = self.price,
            tw = self.total,
        )
    }

    fn row(&self, item: &LineItem) -> String {
        format!(
            "{:<cw$} {:<dw$} {:>qw$} ${:>pw$} ${:>tw$}",
            truncate(&item.product.code, self.code),
            truncate(&item.product.name, self.description),
            item.quantity.format_decimals(2),
            item.product.unit_price.to_decimal_string(),
            item.line_subtotal().to_decimal_string(),
            cw = self.code,
            dw = self.description,
            qw = self.quantity,
            pw = self.price - 1,
            tw = self.total - 1,
        )
    }

    /// Right-aligned label with its amount under the Total column.
    fn total_line(&self, caption: &str, amount: Money) -> String {
        format!(
            "{:>lw$} ${:>tw$}",
            caption,
            amount.to_decimal_string(),
            lw = self.width() - self.total - 1,
            tw = self.total - 1,
        )
    }
}

fn label(full: &str, short: &str, width: usize) -> String {
    if full.chars().count() <= width {
        full.to_string()
    } else {
        short.chars().take(width).collect()
    }
}

/// Renders documents as monospaced text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        TextRenderer
    }

    /// Builds the text without wrapping it in a [`RenderedDocument`].
    pub fn render_text(&self, doc: &dyn BillingDocument, paper: &PaperFormat) -> String {
        let chars = ((paper.profile().usable_width_mm() / 2.0) as usize).max(MIN_LINE_CHARS);
        let columns = Columns::for_line(chars);
        let heavy = "=".repeat(chars);
        let light = "-".repeat(chars);

        let mut lines: Vec<String> = Vec::new();

        // Title
        lines.push(heavy.clone());
        lines.push(centered(doc.kind().title(), chars));
        lines.push(heavy.clone());
        lines.push(String::new());

        // Header
        lines.push(format!("Número: {}", doc.number()));
        lines.push(format!("Fecha: {}", date_time(doc.issued_at())));
        lines.push(format!("Cliente: {}", doc.client()));
        lines.push(light.clone());

        // Items
        lines.push(columns.header());
        lines.push(light.clone());
        for item in doc.line_items() {
            lines.push(columns.row(item));
        }
        lines.push(light);

        // Totals
        lines.push(columns.total_line("Subtotal:", doc.subtotal()));
        let rate = doc.displayed_tax_rate();
        if !rate.is_zero() {
            let caption = format!("Impuesto ({}%):", rate.percent_label());
            lines.push(columns.total_line(&caption, doc.displayed_tax()));
        }
        lines.push(heavy.clone());
        lines.push(columns.total_line("TOTAL:", doc.displayed_total()));
        lines.push(heavy);

        if let Some(notes) = doc.notes() {
            lines.push(String::new());
            lines.push("Notas:".to_string());
            lines.extend(wrap(notes, chars));
        }

        lines.push(String::new());
        lines.push(centered("Gracias por su compra!", chars));

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

impl DocumentRenderer for TextRenderer {
    fn render(
        &self,
        doc: &dyn BillingDocument,
        paper: &PaperFormat,
        _settings: &Settings,
    ) -> RenderResult<RenderedDocument> {
        Ok(RenderedDocument::text(doc, self.render_text(doc, paper)))
    }
}

fn centered(text: &str, width: usize) -> String {
    format!("{:^width$}", text, width = width).trim_end().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
