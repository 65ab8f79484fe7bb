//! # PDF Renderer
//!
//! Branded, paginated PDF built directly on the lopdf object model.
//!
//! ## Page Layout
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ [logo]  COMPANY NAME                               FACTURA   │
//! │         address / Tel | email / tax id                       │
//! │ ════════════════════ accent rule ═══════════════════════════ │
//! │ FACTURAR A                    DETALLES DE FACTURA            │
//! │ Client                        No: FAC-2026-0001              │
//! │                               Fecha: 14/03/2026              │
//! │ ┌──────────────────────────┬──────┬────────┬──────────┐      │
//! │ │ DESCRIPCIÓN         54%  │ 12%  │  16%   │   18%    │ ◄─ accent, repeated
//! │ ├──────────────────────────┼──────┼────────┼──────────┤    on every page
//! │ │ Laptop Dell              │ 2.00 │ $850.00│ $1,700.00│      │
//! │ │ SKU: 001                 │      │        │          │      │
//! │ └──────────────────────────┴──────┴────────┴──────────┘      │
//! │                                SUBTOTAL        $1,700.00     │
//! │                                IMPUESTO (16.0%)  $272.00     │
//! │                                ██ TOTAL ████  $1,972.00 ██   │
//! │ NOTAS ADICIONALES                                            │
//! │ ____________________          ____________________           │
//! │ Autorizado por                Recibido por                   │
//! │        Generado electrónicamente por ... el ...              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Coordinates are tracked top-down in points and flipped when emitted.
//! Text uses the standard Helvetica faces with WinAnsi encoding, so widths
//! are estimated rather than measured.

use chrono::{DateTime, Utc};
use cotiza_core::document::BillingDocument;
use cotiza_core::{LineItem, Settings};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use tracing::debug;

use crate::error::RenderResult;
use crate::format::{date, date_time, grouped_money, truncate, wrap};
use crate::logo::{load_logo, Logo};
use crate::paper::{PaperFormat, PaperProfile};
use crate::renderer::{DocumentRenderer, RenderedDocument};

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Average Helvetica advance width as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;

/// Below this usable width the header and metadata are stacked.
const WIDE_LAYOUT_MM: f32 = 120.0;

/// Table column widths as fractions of the usable width.
const COLUMN_SHARES: [f32; 4] = [0.54, 0.12, 0.16, 0.18];

const LOGO_RESOURCE: &str = "Im1";

fn mm(value: f32) -> f32 {
    value * PT_PER_MM
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_EM
}

/// Longest prefix of `text` that fits in `width` points.
fn fit_text(text: &str, width: f32, size: f32) -> String {
    let chars = (width / (size * AVG_GLYPH_EM)).max(1.0) as usize;
    truncate(text, chars)
}

/// Characters outside Latin-1 have no WinAnsi code here and print as `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c as u8 } else { b'?' })
        .collect()
}

// =============================================================================
// Colors and Fonts
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb(u8, u8, u8);

impl Rgb {
    const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
    const ACCENT: Rgb = Rgb(0x27, 0xAE, 0x60);
    const SECONDARY: Rgb = Rgb(0x2C, 0x3E, 0x50);
    const STRIPE: Rgb = Rgb(0xF2, 0xF4, 0xF4);
    const LABEL: Rgb = Rgb(0x7F, 0x8C, 0x8D);
    const SUBTLE: Rgb = Rgb(0x56, 0x65, 0x73);
    const RULE: Rgb = Rgb(0xD5, 0xDB, 0xDB);
    const FOOTER: Rgb = Rgb(0xBD, 0xC3, 0xC7);

    /// Parses `#RRGGBB`.
    fn from_hex(code: &str) -> Option<Rgb> {
        let hex = code.trim().strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        Some(Rgb((value >> 16) as u8, (value >> 8) as u8, value as u8))
    }

    fn operands(self) -> Vec<Object> {
        vec![
            (self.0 as f32 / 255.0).into(),
            (self.1 as f32 / 255.0).into(),
            (self.2 as f32 / 255.0).into(),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Text style: face, size, color.
#[derive(Debug, Clone, Copy)]
struct Style(Font, f32, Rgb);

// =============================================================================
// Canvas
// =============================================================================

/// Collects drawing operations page by page.
struct Canvas {
    page_width: f32,
    page_height: f32,
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    /// Cursor, in points from the top edge.
    y: f32,
    operations: Vec<Operation>,
    pages: Vec<Content>,
}

impl Canvas {
    fn new(profile: &PaperProfile) -> Self {
        let page_width = mm(profile.width_mm);
        let page_height = mm(profile.height_mm);
        let top = mm(profile.margin_top);

        Canvas {
            page_width,
            page_height,
            left: mm(profile.margin_left),
            right: page_width - mm(profile.margin_right),
            top,
            bottom: page_height - mm(profile.margin_bottom),
            y: top,
            operations: Vec::new(),
            pages: Vec::new(),
        }
    }

    /// Margin-less canvas for drawing on top of a finished page.
    fn overlay(page_width: f32, page_height: f32) -> Self {
        Canvas {
            page_width,
            page_height,
            left: 0.0,
            right: page_width,
            top: 0.0,
            bottom: page_height,
            y: 0.0,
            operations: Vec::new(),
            pages: Vec::new(),
        }
    }

    fn usable(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    fn fits(&self, height: f32) -> bool {
        self.y + height <= self.bottom
    }

    fn new_page(&mut self) {
        let operations = std::mem::take(&mut self.operations);
        self.pages.push(Content { operations });
        self.y = self.top;
    }

    /// Starts a new page unless `height` fits below the cursor. A block
    /// taller than a whole page is drawn anyway.
    fn reserve(&mut self, height: f32) -> bool {
        if self.fits(height) || self.y <= self.top {
            return false;
        }
        self.new_page();
        true
    }

    fn finish(mut self) -> Vec<Content> {
        self.new_page();
        self.pages
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn fill_rect(&mut self, x: f32, top: f32, width: f32, height: f32, color: Rgb) {
        let y = self.page_height - (top + height);
        self.push("rg", color.operands());
        self.push("re", vec![x.into(), y.into(), width.into(), height.into()]);
        self.push("f", vec![]);
    }

    fn hline(&mut self, x1: f32, x2: f32, y: f32, thickness: f32, color: Rgb) {
        let y = self.page_height - y;
        self.push("w", vec![thickness.into()]);
        self.push("RG", color.operands());
        self.push("m", vec![x1.into(), y.into()]);
        self.push("l", vec![x2.into(), y.into()]);
        self.push("S", vec![]);
    }

    fn text(&mut self, x: f32, baseline: f32, style: Style, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let Style(font, size, color) = style;
        self.push("BT", vec![]);
        self.push("Tf", vec![font.resource().into(), size.into()]);
        self.push("rg", color.operands());
        self.push("Td", vec![x.into(), (self.page_height - baseline).into()]);
        self.push("Tj", vec![Object::String(win_ansi(text), StringFormat::Literal)]);
        self.push("ET", vec![]);
    }

    fn text_right(&mut self, right: f32, baseline: f32, style: Style, text: &str) {
        let x = right - text_width(text, style.1);
        self.text(x, baseline, style, text);
    }

    fn text_center(&mut self, center: f32, baseline: f32, style: Style, text: &str) {
        let x = center - text_width(text, style.1) / 2.0;
        self.text(x, baseline, style, text);
    }

    fn image(&mut self, name: &str, x: f32, top: f32, width: f32, height: f32) {
        let y = self.page_height - (top + height);
        self.push("q", vec![]);
        self.push(
            "cm",
            vec![width.into(), 0.0f32.into(), 0.0f32.into(), height.into(), x.into(), y.into()],
        );
        self.push("Do", vec![name.into()]);
        self.push("Q", vec![]);
    }
}

// =============================================================================
// Document Layout
// =============================================================================

struct Layout<'a> {
    doc: &'a dyn BillingDocument,
    settings: &'a Settings,
    profile: PaperProfile,
    accent: Rgb,
    canvas: Canvas,
    wide: bool,
}

impl<'a> Layout<'a> {
    fn new(doc: &'a dyn BillingDocument, profile: PaperProfile, settings: &'a Settings) -> Self {
        let accent = Rgb::from_hex(&settings.branding.accent_color).unwrap_or(Rgb::ACCENT);

        Layout {
            doc,
            settings,
            profile,
            accent,
            canvas: Canvas::new(&profile),
            wide: profile.usable_width_mm() >= WIDE_LAYOUT_MM,
        }
    }

    fn body(&self) -> f32 {
        self.profile.body_size
    }

    fn small(&self) -> f32 {
        (self.profile.body_size - 2.0).max(6.0)
    }

    fn header(&mut self, logo: Option<&Logo>) {
        let settings = self.settings;
        let branding = &settings.branding;
        let left = self.canvas.left;
        let right = self.canvas.right;
        let top = self.canvas.y;

        let title = self.doc.kind().title();
        let title_style = Style(Font::Bold, self.profile.title_size + 6.0, self.accent);
        let name_style = Style(Font::Bold, self.profile.title_size + 2.0, Rgb::SECONDARY);
        let sub_style = Style(Font::Regular, self.small(), Rgb::SUBTLE);

        let mut contact = Vec::new();
        if !branding.phone.is_empty() {
            if branding.phone.contains("Tel") {
                contact.push(branding.phone.clone());
            } else {
                contact.push(format!("Tel: {}", branding.phone));
            }
        }
        if !branding.email.is_empty() {
            contact.push(branding.email.clone());
        }
        let sub_lines: Vec<String> = [branding.address.clone(), contact.join(" | "), branding.tax_id.clone()]
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect();

        let (logo_width, logo_height) = match logo {
            Some(logo) => {
                let width = mm(logo.width_mm).min(self.canvas.usable());
                (width, width * logo.height_mm / logo.width_mm)
            }
            None => (0.0, 0.0),
        };
        if logo.is_some() {
            self.canvas.image(LOGO_RESOURCE, left, top, logo_width, logo_height);
        }

        let info_height = name_style.1 * 1.3 + sub_lines.len() as f32 * sub_style.1 * 1.35;

        let height = if self.wide {
            let info_x = if logo.is_some() { left + logo_width + mm(4.0) } else { left };
            let info_width = right - info_x - text_width(title, title_style.1) - mm(6.0);

            let mut baseline = top + name_style.1;
            let name = fit_text(&branding.company_name, info_width, name_style.1);
            self.canvas.text(info_x, baseline, name_style, &name);
            baseline += name_style.1 * 0.3;
            for line in &sub_lines {
                baseline += sub_style.1 * 1.35;
                let line = fit_text(line, info_width, sub_style.1);
                self.canvas.text(info_x, baseline, sub_style, &line);
            }

            self.canvas.text_right(right, top + title_style.1, title_style, title);
            logo_height.max(info_height).max(title_style.1 * 1.2)
        } else {
            let mut baseline = top;
            if logo.is_some() {
                baseline += logo_height + mm(2.0);
            }
            let width = self.canvas.usable();
            baseline += name_style.1;
            let name = fit_text(&branding.company_name, width, name_style.1);
            self.canvas.text(left, baseline, name_style, &name);
            baseline += name_style.1 * 0.3;
            for line in &sub_lines {
                baseline += sub_style.1 * 1.35;
                let line = fit_text(line, width, sub_style.1);
                self.canvas.text(left, baseline, sub_style, &line);
            }
            baseline += title_style.1 * 1.4;
            self.canvas.text_center(left + width / 2.0, baseline, title_style, title);
            baseline - top + title_style.1 * 0.3
        };

        self.canvas.y = top + height + mm(3.0);

        let thickness = self.body() * 0.4;
        self.canvas.hline(left, right, self.canvas.y, thickness, self.accent);
        self.canvas.y += thickness + mm(4.0);
    }

    fn details(&mut self) {
        let left = self.canvas.left;
        let usable = self.canvas.usable();
        let label = Style(Font::Bold, self.small(), Rgb::LABEL);
        let client = Style(Font::Bold, self.body() + 1.0, Rgb::SECONDARY);
        let value = Style(Font::Regular, self.body(), Rgb::SUBTLE);

        let heading = format!("DETALLES DE {}", self.doc.kind().title());
        let number = format!("No: {}", self.doc.number());
        let issued = format!("Fecha: {}", date(self.doc.issued_at()));

        let top = self.canvas.y;
        if self.wide {
            let column = usable * 0.55;
            let client_name = fit_text(self.doc.client(), column - mm(4.0), client.1);

            self.canvas.text(left, top + label.1, label, "FACTURAR A");
            self.canvas.text(left, top + label.1 + client.1 * 1.5, client, &client_name);

            let x = left + column;
            self.canvas.text(x, top + label.1, label, &heading);
            self.canvas.text(x, top + label.1 + value.1 * 1.5, value, &number);
            self.canvas.text(x, top + label.1 + value.1 * 2.9, value, &issued);

            self.canvas.y = top + label.1 + value.1 * 2.9 + mm(6.0);
        } else {
            let client_name = fit_text(self.doc.client(), usable, client.1);
            let mut baseline = top + label.1;
            self.canvas.text(left, baseline, label, "FACTURAR A");
            baseline += client.1 * 1.5;
            self.canvas.text(left, baseline, client, &client_name);
            baseline += label.1 * 2.2;
            self.canvas.text(left, baseline, label, &heading);
            baseline += value.1 * 1.5;
            self.canvas.text(left, baseline, value, &number);
            baseline += value.1 * 1.4;
            self.canvas.text(left, baseline, value, &issued);

            self.canvas.y = baseline + mm(5.0);
        }
    }

    /// Left edge of each column plus the right edge of the table.
    fn column_edges(&self) -> [f32; 5] {
        let usable = self.canvas.usable();
        let mut edges = [self.canvas.left; 5];
        for (i, share) in COLUMN_SHARES.iter().enumerate() {
            edges[i + 1] = edges[i] + usable * share;
        }
        edges
    }

    fn header_row_height(&self) -> f32 {
        self.body() * 2.0
    }

    fn row_height(&self) -> f32 {
        self.body() * 2.8
    }

    fn table_header(&mut self) {
        let edges = self.column_edges();
        let height = self.header_row_height();
        let top = self.canvas.y;
        let pad = mm(2.0);
        let style = Style(Font::Bold, self.body() - 1.0, Rgb::WHITE);
        let baseline = top + height / 2.0 + style.1 * 0.35;

        self.canvas.fill_rect(edges[0], top, edges[4] - edges[0], height, self.accent);
        self.canvas.text(edges[0] + pad, baseline, style, "DESCRIPCIÓN");
        for (i, caption) in ["CANT.", "PRECIO", "TOTAL"].iter().enumerate() {
            self.canvas.text_right(edges[i + 2] - pad, baseline, style, caption);
        }

        self.canvas.y += height;
    }

    fn table_row(&mut self, index: usize, item: &LineItem) {
        let edges = self.column_edges();
        let height = self.row_height();
        let top = self.canvas.y;
        let pad = mm(2.0);
        let name_style = Style(Font::Bold, self.body() - 1.0, Rgb::SECONDARY);
        let sku_style = Style(Font::Regular, self.small().min(7.0), Rgb::LABEL);
        let value_style = Style(Font::Regular, self.body() - 1.0, Rgb::SECONDARY);

        if index % 2 == 1 {
            self.canvas.fill_rect(edges[0], top, edges[4] - edges[0], height, Rgb::STRIPE);
        }

        let name_baseline = top + name_style.1 * 1.4;
        let description_width = edges[1] - edges[0] - pad * 2.0;
        let name = fit_text(&item.product.name, description_width, name_style.1);
        let sku = fit_text(&format!("SKU: {}", item.product.code), description_width, sku_style.1);
        self.canvas.text(edges[0] + pad, name_baseline, name_style, &name);
        self.canvas.text(edges[0] + pad, name_baseline + sku_style.1 * 1.4, sku_style, &sku);

        let values = [
            item.quantity.format_decimals(2),
            grouped_money(item.product.unit_price),
            grouped_money(item.line_subtotal()),
        ];
        for (i, value) in values.iter().enumerate() {
            self.canvas.text_right(edges[i + 2] - pad, name_baseline, value_style, value);
        }

        self.canvas.hline(edges[0], edges[4], top + height, 0.5, Rgb::RULE);
        self.canvas.y += height;
    }

    fn items(&mut self) {
        let first_block = self.header_row_height() + self.row_height();
        self.canvas.reserve(first_block);
        self.table_header();

        let doc = self.doc;
        for (index, item) in doc.line_items().iter().enumerate() {
            if self.canvas.reserve(self.row_height()) {
                self.table_header();
            }
            self.table_row(index, item);
        }

        self.canvas.y += mm(4.0);
    }

    fn totals(&mut self) {
        let rate = self.doc.displayed_tax_rate();
        let line = self.body() * 1.6;
        let box_height = self.body() * 2.4;
        let row_count = if rate.is_zero() { 1.0 } else { 2.0 };
        self.canvas.reserve(row_count * line + box_height + mm(6.0));

        let right = self.canvas.right;
        let x = self.canvas.left + self.canvas.usable() * 0.5;
        let pad = mm(2.0);
        let label = Style(Font::Bold, self.body() - 1.0, Rgb::LABEL);
        let value = Style(Font::Regular, self.body(), Rgb::SECONDARY);

        let mut rows = vec![("SUBTOTAL".to_string(), self.doc.subtotal())];
        if !rate.is_zero() {
            rows.push((format!("IMPUESTO ({}%)", rate.percent_label()), self.doc.displayed_tax()));
        }
        for (caption, amount) in rows {
            let baseline = self.canvas.y + line * 0.75;
            self.canvas.text(x + pad, baseline, label, &caption);
            self.canvas.text_right(right - pad, baseline, value, &grouped_money(amount));
            self.canvas.y += line;
        }

        self.canvas.y += mm(1.0);
        let top = self.canvas.y;
        let emphasis = Style(Font::Bold, self.body() + 2.0, Rgb::WHITE);
        let baseline = top + box_height / 2.0 + emphasis.1 * 0.35;
        self.canvas.fill_rect(x, top, right - x, box_height, self.accent);
        self.canvas.text(x + pad, baseline, Style(Font::Bold, self.body() + 1.0, Rgb::WHITE), "TOTAL");
        self.canvas
            .text_right(right - pad, baseline, emphasis, &grouped_money(self.doc.displayed_total()));

        self.canvas.y = top + box_height + mm(6.0);
    }

    fn notes(&mut self) {
        let notes = match self.doc.notes() {
            Some(notes) => notes,
            None => return,
        };

        let label = Style(Font::Bold, self.small(), Rgb::LABEL);
        let text = Style(Font::Regular, self.body() - 1.0, Rgb::SUBTLE);
        let step = text.1 * 1.4;
        let chars = (self.canvas.usable() / (text.1 * AVG_GLYPH_EM)) as usize;
        let lines = wrap(notes, chars);

        self.canvas.reserve(label.1 * 1.8 + step);
        self.canvas.text(self.canvas.left, self.canvas.y + label.1, label, "NOTAS ADICIONALES");
        self.canvas.y += label.1 * 1.8;

        for line in lines {
            self.canvas.reserve(step);
            self.canvas.y += step;
            let left = self.canvas.left;
            let baseline = self.canvas.y;
            self.canvas.text(left, baseline, text, &line);
        }

        self.canvas.y += mm(6.0);
    }

    fn signatures(&mut self) {
        self.canvas.reserve(mm(24.0));

        let usable = self.canvas.usable();
        let width = usable * if self.wide { 0.4 } else { 0.45 };
        let left_line = (self.canvas.left, self.canvas.left + width);
        let right_line = (self.canvas.right - width, self.canvas.right);
        let line_y = self.canvas.y + mm(15.0);
        let name = Style(Font::Regular, self.small(), Rgb::SECONDARY);
        let caption = Style(Font::Regular, self.small(), Rgb::LABEL);

        let signer = fit_text(&self.settings.branding.signer, width, name.1);
        self.canvas.text_center((left_line.0 + left_line.1) / 2.0, line_y - mm(2.0), name, &signer);

        for ((x1, x2), text) in [(left_line, "Autorizado por"), (right_line, "Recibido por")] {
            self.canvas.hline(x1, x2, line_y, 0.8, Rgb::SECONDARY);
            self.canvas.text_center((x1 + x2) / 2.0, line_y + caption.1 * 1.5, caption, text);
        }

        self.canvas.y = line_y + mm(8.0);
    }

    /// Draws the body of the document and returns one content stream per
    /// page, footers included.
    fn draw(mut self, logo: Option<&Logo>, generated_at: DateTime<Utc>) -> Vec<Content> {
        self.header(logo);
        self.details();
        self.items();
        self.totals();
        self.notes();
        self.signatures();

        let footer_lines = {
            let text = format!(
                "Generado electrónicamente por {} el {}",
                self.settings.branding.company_name,
                date_time(generated_at)
            );
            let size = self.small().min(7.0);
            wrap(&text, (self.canvas.usable() / (size * AVG_GLYPH_EM)) as usize)
        };

        let page_width = self.canvas.page_width;
        let page_height = self.canvas.page_height;
        let margin_bottom = mm(self.profile.margin_bottom);
        let style = Style(Font::Regular, self.small().min(7.0), Rgb::FOOTER);
        let mut pages = self.canvas.finish();
        let count = pages.len();

        for (index, page) in pages.iter_mut().enumerate() {
            let mut lines = footer_lines.clone();
            if count > 1 {
                lines.push(format!("Página {} de {}", index + 1, count));
            }
            let mut footer = Canvas::overlay(page_width, page_height);
            let mut baseline = page_height - margin_bottom * 0.6;
            for line in &lines {
                footer.text_center(page_width / 2.0, baseline, style, line);
                baseline += style.1 * 1.3;
            }
            page.operations.extend(footer.operations);
        }

        pages
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Renders documents as PDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        PdfRenderer
    }

    /// Builds the PDF bytes.
    pub fn render_pdf(
        &self,
        doc: &dyn BillingDocument,
        paper: &PaperFormat,
        settings: &Settings,
    ) -> RenderResult<Vec<u8>> {
        let profile = paper.profile();
        let logo = load_logo(&settings.branding);
        let pages = Layout::new(doc, profile, settings).draw(logo.as_ref(), Utc::now());

        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();

        let regular_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut resources = dictionary! {
            "Font" => dictionary! {
                Font::Regular.resource() => regular_id,
                Font::Bold.resource() => bold_id,
            },
        };
        if let Some(logo) = &logo {
            let image = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => logo.width_px as i64,
                    "Height" => logo.height_px as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                logo.rgb.clone(),
            );
            let image_id = document.add_object(image);
            resources.set("XObject", dictionary! { LOGO_RESOURCE => image_id });
        }
        let resources_id = document.add_object(resources);

        let media_box: Vec<Object> = vec![
            0.into(),
            0.into(),
            mm(profile.width_mm).into(),
            mm(profile.height_mm).into(),
        ];
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for content in &pages {
            let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
            }),
        );

        let catalog_id = document.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        document.trailer.set("Root", catalog_id);

        let title = format!("{} {}", doc.kind().title(), doc.number());
        let info_id = document.add_object(dictionary! {
            "Title" => Object::String(win_ansi(&title), StringFormat::Literal),
            "Producer" => Object::string_literal("Cotiza"),
        });
        document.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        document.save_to(&mut bytes)?;

        debug!(
            number = %doc.number(),
            pages = pages.len(),
            bytes = bytes.len(),
            logo = logo.is_some(),
            "PDF rendered"
        );
        Ok(bytes)
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(
        &self,
        doc: &dyn BillingDocument,
        paper: &PaperFormat,
        settings: &Settings,
    ) -> RenderResult<RenderedDocument> {
        let bytes = self.render_pdf(doc, paper, settings)?;
        Ok(RenderedDocument::pdf(doc, bytes))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logo::png_data_uri;
    use cotiza_core::{Invoice, Money, Product, Quantity, Quotation, TaxRate};

    fn line(code: &str, name: &str, cents: i64, units: i64) -> LineItem {
        let product = Product::new(code, name, Money::from_cents(cents), Quantity::from_units(100));
        LineItem::new(product.snapshot(), Quantity::from_units(units)).unwrap()
    }

    fn invoice(lines: usize) -> Invoice {
        let mut invoice = Invoice::new("FAC-2026-0001", "ACME Industrial", TaxRate::from_bps(1600))
            .with_notes(Some("Entrega en sucursal centro".to_string()));
        for n in 0..lines {
            invoice.add_line_item(line(&format!("{:03}", n + 1), "Laptop Dell", 85000, 1));
        }
        invoice
    }

    fn page_contents(bytes: &[u8]) -> Vec<Vec<u8>> {
        let doc = lopdf::Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|id| doc.get_page_content(*id).unwrap())
            .collect()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn has_image(bytes: &[u8]) -> bool {
        let doc = lopdf::Document::load_mem(bytes).unwrap();
        doc.objects.values().any(|object| match object {
            Object::Stream(stream) => stream
                .dict
                .get(b"Subtype")
                .and_then(|subtype| subtype.as_name())
                .map(|name| name == b"Image")
                .unwrap_or(false),
            _ => false,
        })
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(Rgb::from_hex("#27AE60"), Some(Rgb::ACCENT));
        assert_eq!(Rgb::from_hex("#ffffff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::from_hex("27AE60"), None);
        assert_eq!(Rgb::from_hex("#27AE6"), None);
        assert_eq!(Rgb::from_hex("#GGGGGG"), None);
    }

    #[test]
    fn test_win_ansi_keeps_latin1() {
        assert_eq!(win_ansi("COTIZACIÓN"), b"COTIZACI\xD3N".to_vec());
        assert_eq!(win_ansi("a→b"), b"a?b".to_vec());
    }

    #[test]
    fn test_single_page_invoice() {
        let bytes = PdfRenderer::new()
            .render_pdf(&invoice(2), &PaperFormat::Standard, &Settings::default())
            .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        let pages = page_contents(&bytes);
        assert_eq!(pages.len(), 1);
        assert!(contains(&pages[0], b"(FACTURA)"));
        assert!(contains(&pages[0], b"(FACTURAR A)"));
        assert!(contains(&pages[0], b"($1,700.00)"));
        assert!(contains(&pages[0], b"(Autorizado por)"));
        assert!(contains(&pages[0], b"(NOTAS ADICIONALES)"));
        assert!(!has_image(&bytes));
    }

    #[test]
    fn test_long_invoice_repeats_table_header() {
        let bytes = PdfRenderer::new()
            .render_pdf(&invoice(80), &PaperFormat::Receipt, &Settings::default())
            .unwrap();

        let pages = page_contents(&bytes);
        assert!(pages.len() > 1);
        for page in &pages[..pages.len() - 1] {
            assert!(contains(page, b"CANT."));
        }
        assert!(contains(&pages[0], b"(P\xE1gina 1 de "));
    }

    #[test]
    fn test_quotation_shows_no_tax() {
        let mut quotation = Quotation::new("COT-0001", "ACME", TaxRate::from_bps(1600));
        quotation.add_line_item(line("001", "Laptop Dell", 85000, 1));

        let bytes = PdfRenderer::new()
            .render_pdf(&quotation, &PaperFormat::Letter, &Settings::default())
            .unwrap();

        let pages = page_contents(&bytes);
        assert!(!contains(&pages[0], b"IMPUESTO"));
        assert!(contains(&pages[0], b"(SUBTOTAL)"));
    }

    #[test]
    fn test_logo_is_embedded() {
        let mut settings = Settings::default();
        settings.branding.logo = png_data_uri(8, 4);

        let bytes = PdfRenderer::new()
            .render_pdf(&invoice(1), &PaperFormat::Standard, &settings)
            .unwrap();

        assert!(has_image(&bytes));
        assert!(contains(&page_contents(&bytes)[0], b"/Im1 Do"));
    }

    #[test]
    fn test_broken_logo_falls_back_to_text_header() {
        let mut settings = Settings::default();
        settings.branding.logo = "data:image/png;base64,bm90IGFuIGltYWdl".to_string();

        let bytes = PdfRenderer::new()
            .render_pdf(&invoice(1), &PaperFormat::Standard, &settings)
            .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        assert!(!has_image(&bytes));
    }

    #[test]
    fn test_render_returns_pdf_output() {
        let output = PdfRenderer::new()
            .render(&invoice(1), &PaperFormat::Standard, &Settings::default())
            .unwrap();

        assert_eq!(output.filename, "factura_FAC-2026-0001.pdf");
        assert_eq!(output.content_type, "application/pdf");
        assert!(output.body.as_bytes().starts_with(b"%PDF"));
    }
}
