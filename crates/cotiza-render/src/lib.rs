//! # cotiza-render: Document Rendering for Cotiza
//!
//! Paper format × output renderer, behind a name-keyed registry.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         cotiza-render                                   │
//! │                                                                         │
//! │  RenderEngine (registry.rs)                                             │
//! │     │   "texto" / "text"          "pdf"                                 │
//! │     │        │                      │                                   │
//! │     │        ▼                      ▼                                   │
//! │     │  ┌──────────────┐      ┌──────────────┐     ┌──────────────┐     │
//! │     │  │ TextRenderer │      │ PdfRenderer  │────►│ logo.rs      │     │
//! │     │  │  (text.rs)   │      │  (pdf.rs)    │     │ data URI →   │     │
//! │     │  └──────┬───────┘      └──────┬───────┘     │ RGB pixels   │     │
//! │     │         └─────────┬───────────┘             └──────────────┘     │
//! │     │                   ▼                                               │
//! │     │        impl DocumentRenderer (renderer.rs)                        │
//! │     │                                                                   │
//! │     └── "normal" / "termico" / "carta" ──► PaperFormat (paper.rs)       │
//! │                                                                         │
//! │  Output: RenderedDocument { Text | Binary, filename, content_type }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cotiza_core::{Invoice, LineItem, Money, Product, Quantity, Settings, TaxRate};
//! use cotiza_render::RenderEngine;
//!
//! let laptop = Product::new("001", "Laptop Dell", Money::from_cents(85000), Quantity::from_units(10));
//! let mut invoice = Invoice::new("FAC-2026-0001", "ACME", TaxRate::from_bps(1600));
//! invoice.add_line_item(LineItem::new(laptop.snapshot(), Quantity::from_units(1)).unwrap());
//!
//! let engine = RenderEngine::new();
//! let output = engine.render(&invoice, "texto", "termico", &Settings::default()).unwrap();
//!
//! assert_eq!(output.filename, "factura_FAC-2026-0001.txt");
//! assert!(output.as_text().unwrap().contains("TOTAL:"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
mod format;
pub mod logo;
pub mod paper;
pub mod pdf;
pub mod registry;
pub mod renderer;
pub mod text;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{RenderError, RenderResult};
pub use paper::{PaperFormat, PaperProfile};
pub use pdf::PdfRenderer;
pub use registry::{RenderEngine, DEFAULT_FORMAT, DEFAULT_RENDERER};
pub use renderer::{DocumentRenderer, RenderBody, RenderedDocument};
pub use text::TextRenderer;
