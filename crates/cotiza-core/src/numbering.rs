//! # Document Number Templates
//!
//! Formatting rules for invoice and quotation numbers.
//!
//! ## Template Syntax
//! ```text
//! "{prefix}-{year}-{number}"      ──►  FAC-2026-0042
//! "{prefix}/{number:06}/{year}"   ──►  FAC/000042/2026
//!
//!  {prefix}     configured prefix ("FAC", "COT")
//!  {year}       four-digit year of issue
//!  {number}     running counter, zero-padded to the configured width
//!  {number:0N}  running counter, zero-padded to N (overrides the width)
//! ```
//!
//! Parsing happens when settings are validated, so a broken template is
//! rejected when it is saved rather than when the next invoice is issued.

use crate::error::ValidationError;

/// Template used when the settings do not override it.
pub const DEFAULT_NUMBER_TEMPLATE: &str = "{prefix}-{year}-{number}";

/// Default minimum number of digits of the running counter.
pub const DEFAULT_NUMBER_WIDTH: usize = 4;

/// Upper bound for the padding width.
pub const MAX_NUMBER_WIDTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Prefix,
    Year,
    Number { width: Option<usize> },
}

/// A parsed number template.
///
/// ## Example
/// ```rust
/// use cotiza_core::numbering::NumberTemplate;
///
/// let template = NumberTemplate::parse("{prefix}-{year}-{number}").unwrap();
/// assert_eq!(template.format("FAC", 2026, 7, 4), "FAC-2026-0007");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberTemplate {
    segments: Vec<Segment>,
}

impl NumberTemplate {
    /// Parses and validates a template string.
    pub fn parse(template: &str) -> Result<Self, ValidationError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut placeholder = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        placeholder.push(inner);
                    }
                    if !closed {
                        return Err(template_error("unclosed '{'"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_placeholder(&placeholder)?);
                }
                '}' => return Err(template_error("unexpected '}'")),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.iter().any(|s| matches!(s, Segment::Number { .. })) {
            return Err(template_error("the {number} placeholder is required"));
        }

        Ok(NumberTemplate { segments })
    }

    /// Renders a number.
    ///
    /// `default_width` applies to `{number}` placeholders without an
    /// explicit width.
    pub fn format(&self, prefix: &str, year: i32, number: u64, default_width: usize) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Prefix => out.push_str(prefix),
                Segment::Year => out.push_str(&format!("{:04}", year)),
                Segment::Number { width } => {
                    let width = width.unwrap_or(default_width);
                    out.push_str(&format!("{:0width$}", number, width = width));
                }
            }
        }
        out
    }
}

impl Default for NumberTemplate {
    fn default() -> Self {
        NumberTemplate {
            segments: vec![
                Segment::Prefix,
                Segment::Literal("-".to_string()),
                Segment::Year,
                Segment::Literal("-".to_string()),
                Segment::Number { width: None },
            ],
        }
    }
}

fn parse_placeholder(placeholder: &str) -> Result<Segment, ValidationError> {
    let (name, modifier) = match placeholder.split_once(':') {
        Some((name, modifier)) => (name.trim(), Some(modifier.trim())),
        None => (placeholder.trim(), None),
    };

    match (name, modifier) {
        ("prefix", None) => Ok(Segment::Prefix),
        ("year", None) => Ok(Segment::Year),
        ("number", None) => Ok(Segment::Number { width: None }),
        ("number", Some(modifier)) => {
            let digits = modifier.strip_suffix('d').unwrap_or(modifier);
            let width: usize = digits
                .parse()
                .map_err(|_| template_error(format!("invalid width '{}'", modifier)))?;
            if width == 0 || width > MAX_NUMBER_WIDTH {
                return Err(template_error(format!(
                    "width must be between 1 and {}",
                    MAX_NUMBER_WIDTH
                )));
            }
            Ok(Segment::Number { width: Some(width) })
        }
        (other, _) => Err(template_error(format!("unknown placeholder '{{{}}}'", other))),
    }
}

fn template_error(reason: impl Into<String>) -> ValidationError {
    ValidationError::invalid_format("number_template", reason)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template() {
        let parsed = NumberTemplate::parse(DEFAULT_NUMBER_TEMPLATE).unwrap();
        assert_eq!(parsed, NumberTemplate::default());
        assert_eq!(parsed.format("FAC", 2026, 1, 4), "FAC-2026-0001");
        assert_eq!(parsed.format("COT", 2026, 12345, 4), "COT-2026-12345");
    }

    #[test]
    fn test_explicit_width() {
        let template = NumberTemplate::parse("{prefix}/{number:06}/{year}").unwrap();
        assert_eq!(template.format("FAC", 2026, 42, 4), "FAC/000042/2026");

        let template = NumberTemplate::parse("{number:05d}").unwrap();
        assert_eq!(template.format("X", 2026, 7, 4), "00007");
    }

    #[test]
    fn test_default_width_applies() {
        let template = NumberTemplate::default();
        assert_eq!(template.format("FAC", 2026, 3, 6), "FAC-2026-000003");
    }

    #[test]
    fn test_invalid_templates() {
        assert!(NumberTemplate::parse("{prefix}-{year}").is_err());
        assert!(NumberTemplate::parse("{prefijo}-{number}").is_err());
        assert!(NumberTemplate::parse("{number").is_err());
        assert!(NumberTemplate::parse("number}").is_err());
        assert!(NumberTemplate::parse("{number:0}").is_err());
        assert!(NumberTemplate::parse("{number:xx}").is_err());
        assert!(NumberTemplate::parse("{year:04}-{number}").is_err());
    }
}
