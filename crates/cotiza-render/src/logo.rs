//! # Logo Decoding
//!
//! The branding logo is stored as a `data:image/...;base64,` URI. It is
//! decoded once per PDF, flattened onto white and sized to fit the header
//! box.
//!
//! ```text
//! data URI ──► base64 ──► image::load_from_memory ──► RGBA ──► RGB on white
//!                                                               │
//!                                       fit into 55 × 28 mm ◄───┘
//! ```
//!
//! Any failure leaves the document with a text-only header.

use base64::{engine::general_purpose, Engine as _};
use cotiza_core::Branding;
use tracing::{debug, warn};

use crate::error::{RenderError, RenderResult};

/// Header box the logo must fit in.
pub const LOGO_MAX_WIDTH_MM: f32 = 55.0;
pub const LOGO_MAX_HEIGHT_MM: f32 = 28.0;

/// A decoded logo ready to be embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    pub width_px: u32,
    pub height_px: u32,
    /// Packed 8-bit RGB, row major.
    pub rgb: Vec<u8>,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// Decodes a data URI (or bare base64) into a [`Logo`].
pub fn decode_logo(source: &str) -> RenderResult<Logo> {
    let source = source.trim();
    let payload = if source.starts_with("data:") {
        source
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| RenderError::Image("data URI without payload".to_string()))?
    } else {
        source
    };

    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| RenderError::Image(format!("invalid base64: {}", e)))?;

    let image = image::load_from_memory(&bytes)?.to_rgba8();
    let (width_px, height_px) = image.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(RenderError::Image("empty image".to_string()));
    }

    let mut rgb = Vec::with_capacity(width_px as usize * height_px as usize * 3);
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        for channel in [r, g, b] {
            rgb.push(over_white(channel, a));
        }
    }

    let (width_mm, height_mm) = fit(width_px, height_px);
    debug!(width_px, height_px, width_mm, height_mm, "Logo decoded");

    Ok(Logo {
        width_px,
        height_px,
        rgb,
        width_mm,
        height_mm,
    })
}

/// The configured logo, or `None` when there is none or it is unreadable.
pub fn load_logo(branding: &Branding) -> Option<Logo> {
    if !branding.has_logo() {
        return None;
    }

    match decode_logo(&branding.logo) {
        Ok(logo) => Some(logo),
        Err(e) => {
            warn!(error = %e, "Logo could not be decoded, using text-only header");
            None
        }
    }
}

/// Height first, then width capped with the height recomputed.
fn fit(width_px: u32, height_px: u32) -> (f32, f32) {
    let aspect = width_px as f32 / height_px as f32;
    let mut height = LOGO_MAX_HEIGHT_MM;
    let mut width = height * aspect;
    if width > LOGO_MAX_WIDTH_MM {
        width = LOGO_MAX_WIDTH_MM;
        height = width / aspect;
    }
    (width, height)
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a)) / 255) as u8
}

/// Solid green PNG as a data URI.
#[cfg(test)]
pub(crate) fn png_data_uri(width: u32, height: u32) -> String {
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    let image = RgbaImage::from_pixel(width, height, Rgba([39, 174, 96, 255]));
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(bytes))
}

// =============================================================================
// Unit Tests
// =============================================================================
