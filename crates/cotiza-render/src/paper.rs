//! # Paper Formats
//!
//! Page geometry shared by every renderer.
//!
//! ```text
//!        ◄──────────── width_mm ────────────►
//!      ┌──────────────────────────────────────┐ ▲
//!      │            margin_top                │ │
//!      │   ┌──────────────────────────────┐   │ │
//!      │ L │                              │ R │ height_mm
//!      │   │   usable_width_mm()          │   │ │
//!      │   └──────────────────────────────┘   │ │
//!      │            margin_bottom             │ │
//!      └──────────────────────────────────────┘ ▼
//! ```
//!
//! | Format   | Name      | Size (mm) | Margins T/R/B/L | Title | Body | Spacing |
//! |----------|-----------|-----------|-----------------|-------|------|---------|
//! | Standard | `normal`  | 210 × 297 | 15/15/15/15     | 16    | 10   | 12      |
//! | Receipt  | `termico` | 80 × 297  | 10/5/10/5       | 12    | 8    | 10      |
//! | Letter   | `carta`   | 216 × 279 | 25/25/25/25     | 18    | 11   | 14      |

/// Dimensions and typography of one paper format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperProfile {
    pub width_mm: f32,
    pub height_mm: f32,
    /// Title font size in points.
    pub title_size: f32,
    /// Body font size in points.
    pub body_size: f32,
    /// Distance between text baselines in points.
    pub line_spacing: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
}

impl PaperProfile {
    /// Width between the left and right margins.
    pub fn usable_width_mm(&self) -> f32 {
        (self.width_mm - self.margin_left - self.margin_right).max(0.0)
    }

    /// Height between the top and bottom margins.
    pub fn usable_height_mm(&self) -> f32 {
        (self.height_mm - self.margin_top - self.margin_bottom).max(0.0)
    }

    /// Same margins on every side.
    pub fn with_margins(mut self, margin: f32) -> Self {
        self.margin_top = margin;
        self.margin_right = margin;
        self.margin_bottom = margin;
        self.margin_left = margin;
        self
    }
}

/// Paper format passed to a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaperFormat {
    /// A4 portrait.
    Standard,
    /// 80 mm thermal roll.
    Receipt,
    /// US Letter.
    Letter,
    /// Anything else, registered at runtime.
    Custom(PaperProfile),
}

impl PaperFormat {
    /// Built-in formats with their registry names.
    pub const BUILT_IN: [(&'static str, PaperFormat); 3] = [
        ("normal", PaperFormat::Standard),
        ("termico", PaperFormat::Receipt),
        ("carta", PaperFormat::Letter),
    ];

    pub fn profile(&self) -> PaperProfile {
        match self {
            PaperFormat::Standard => PaperProfile {
                width_mm: 210.0,
                height_mm: 297.0,
                title_size: 16.0,
                body_size: 10.0,
                line_spacing: 12.0,
                margin_top: 0.0,
                margin_right: 0.0,
                margin_bottom: 0.0,
                margin_left: 0.0,
            }
            .with_margins(15.0),
            PaperFormat::Receipt => PaperProfile {
                width_mm: 80.0,
                height_mm: 297.0,
                title_size: 12.0,
                body_size: 8.0,
                line_spacing: 10.0,
                margin_top: 10.0,
                margin_right: 5.0,
                margin_bottom: 10.0,
                margin_left: 5.0,
            },
            PaperFormat::Letter => PaperProfile {
                width_mm: 216.0,
                height_mm: 279.0,
                title_size: 18.0,
                body_size: 11.0,
                line_spacing: 14.0,
                margin_top: 0.0,
                margin_right: 0.0,
                margin_bottom: 0.0,
                margin_left: 0.0,
            }
            .with_margins(25.0),
            PaperFormat::Custom(profile) => *profile,
        }
    }

    /// Registry name of a built-in format. Custom formats are named by
    /// whoever registers them.
    pub fn name(&self) -> &'static str {
        match self {
            PaperFormat::Standard => "normal",
            PaperFormat::Receipt => "termico",
            PaperFormat::Letter => "carta",
            PaperFormat::Custom(_) => "personalizado",
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
