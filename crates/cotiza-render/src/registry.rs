//! # Render Engine
//!
//! Name-keyed registry of renderers and paper formats. The CLI and any
//! other front-end only ever see names.
//!
//! ```text
//!   render(doc, "pdf", "termico", settings)
//!        │
//!        ├── renderers: "pdf" ──► PdfRenderer ┐
//!        │              "texto"/"text" ──► TextRenderer
//!        │                                    │
//!        ├── formats:   "termico" ──► PaperFormat::Receipt
//!        │                                    │
//!        ▼                                    ▼
//!   catch_unwind( renderer.render(doc, paper, settings) )
//!        │
//!        ├── Ok(output)       → RenderedDocument
//!        ├── Err(e)           → error! + Err(e)
//!        └── panic            → error! + Err(RenderError::Panicked)
//! ```
//!
//! Names are matched case-insensitively. Registering a name that is
//! already taken is refused, so built-ins cannot be replaced by accident.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use cotiza_core::document::BillingDocument;
use cotiza_core::Settings;
use tracing::{debug, error, info};

use crate::error::{RenderError, RenderResult};
use crate::paper::PaperFormat;
use crate::pdf::PdfRenderer;
use crate::renderer::{DocumentRenderer, RenderedDocument};
use crate::text::TextRenderer;

/// Renderer used when a caller does not pick one.
pub const DEFAULT_RENDERER: &str = "texto";

/// Paper format used when a caller does not pick one.
pub const DEFAULT_FORMAT: &str = "normal";

/// Registry of renderers and paper formats.
#[derive(Clone)]
pub struct RenderEngine {
    renderers: BTreeMap<String, Arc<dyn DocumentRenderer>>,
    formats: BTreeMap<String, PaperFormat>,
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngine")
            .field("renderers", &self.renderer_names())
            .field("formats", &self.format_names())
            .finish()
    }
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl RenderEngine {
    /// Engine with the built-in renderers and formats.
    pub fn new() -> Self {
        let mut engine = RenderEngine::empty();

        let text: Arc<dyn DocumentRenderer> = Arc::new(TextRenderer::new());
        engine.register_renderer("texto", Arc::clone(&text));
        engine.register_renderer("text", text);
        engine.register_renderer("pdf", Arc::new(PdfRenderer::new()));

        for (name, format) in PaperFormat::BUILT_IN {
            engine.register_format(name, format);
        }
        engine
    }

    /// Engine with nothing registered.
    pub fn empty() -> Self {
        RenderEngine {
            renderers: BTreeMap::new(),
            formats: BTreeMap::new(),
        }
    }

    /// Registered renderer names, sorted.
    pub fn renderer_names(&self) -> Vec<&str> {
        self.renderers.keys().map(String::as_str).collect()
    }

    /// Registered paper format names, sorted.
    pub fn format_names(&self) -> Vec<&str> {
        self.formats.keys().map(String::as_str).collect()
    }

    /// Adds a renderer. Returns false, leaving the registry as it was,
    /// when the name is already taken.
    pub fn register_renderer(&mut self, name: &str, renderer: Arc<dyn DocumentRenderer>) -> bool {
        let name = key(name);
        if name.is_empty() || self.renderers.contains_key(&name) {
            debug!(renderer = %name, "Renderer name not available");
            return false;
        }
        self.renderers.insert(name, renderer);
        true
    }

    /// Adds a paper format. Returns false when the name is already taken.
    pub fn register_format(&mut self, name: &str, format: PaperFormat) -> bool {
        let name = key(name);
        if name.is_empty() || self.formats.contains_key(&name) {
            debug!(format = %name, "Paper format name not available");
            return false;
        }
        self.formats.insert(name, format);
        true
    }

    /// Looks up a paper format by name.
    pub fn paper(&self, name: &str) -> RenderResult<PaperFormat> {
        self.formats
            .get(&key(name))
            .copied()
            .ok_or_else(|| RenderError::UnknownFormat(name.to_string()))
    }

    fn renderer(&self, name: &str) -> RenderResult<Arc<dyn DocumentRenderer>> {
        self.renderers
            .get(&key(name))
            .cloned()
            .ok_or_else(|| RenderError::UnknownRenderer(name.to_string()))
    }

    /// Renders `doc` with the named renderer on the named paper.
    ///
    /// A failing or panicking renderer yields an error and no output.
    pub fn render(
        &self,
        doc: &dyn BillingDocument,
        renderer_name: &str,
        format_name: &str,
        settings: &Settings,
    ) -> RenderResult<RenderedDocument> {
        let renderer = self.renderer(renderer_name)?;
        let paper = self.paper(format_name)?;

        debug!(
            number = %doc.number(),
            renderer = renderer_name,
            format = format_name,
            "Rendering document"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(doc, &paper, settings)));

        match outcome {
            Ok(Ok(output)) => {
                info!(
                    number = %doc.number(),
                    file = %output.filename,
                    bytes = output.body.len(),
                    "Document rendered"
                );
                Ok(output)
            }
            Ok(Err(e)) => {
                error!(
                    number = %doc.number(),
                    renderer = renderer_name,
                    format = format_name,
                    error = %e,
                    "Rendering failed"
                );
                Err(e)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    number = %doc.number(),
                    renderer = renderer_name,
                    format = format_name,
                    panic = %message,
                    "Renderer panicked"
                );
                Err(RenderError::Panicked {
                    renderer: key(renderer_name),
                    message,
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
