//! # Render Error Types
//!
//! Every failure while producing a document ends up as a [`RenderError`].
//! The registry is the only place that logs them.
//!
//! ```text
//! lopdf::Error ─────┐
//! image::ImageError ┼──► RenderError ──► RenderEngine::render (error! + Err)
//! panic in renderer ┘
//! ```

use thiserror::Error;

/// Rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No renderer registered under the requested name.
    ///
    /// ## When This Occurs
    /// - Typo in `--renderer`
    /// - A custom renderer was never registered
    #[error("Unknown renderer '{0}'")]
    UnknownRenderer(String),

    /// No paper format registered under the requested name.
    #[error("Unknown paper format '{0}'")]
    UnknownFormat(String),

    /// PDF object model or serialization failure.
    ///
    /// ## When This Occurs
    /// - Content stream encoding fails
    /// - Writing the document buffer fails
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Logo could not be decoded.
    ///
    /// ## When This Occurs
    /// - The data URI is not base64
    /// - The bytes are not a supported image format
    ///
    /// The PDF renderer catches this and falls back to a text-only header.
    #[error("Image error: {0}")]
    Image(String),

    /// A renderer panicked. Nothing it produced is returned.
    #[error("Renderer '{renderer}' panicked: {message}")]
    Panicked { renderer: String, message: String },
}

impl From<lopdf::Error> for RenderError {
    fn from(e: lopdf::Error) -> Self {
        RenderError::Pdf(e.to_string())
    }
}

impl From<image::ImageError> for RenderError {
    fn from(e: image::ImageError) -> Self {
        RenderError::Image(e.to_string())
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Pdf(e.to_string())
    }
}

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;
