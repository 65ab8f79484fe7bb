//! # Settings
//!
//! Business configuration stored alongside the data: numbering, default tax
//! and the branding printed on rendered documents.
//!
//! Settings are loaded once per operation and passed down as an immutable
//! snapshot. Nothing in the workspace keeps a global copy.
//!
//! ```text
//! SettingsStore::load() ──► Settings ──┬──► NumberSequencer (prefix, template, width)
//!                                      ├──► BillingService  (default_tax)
//!                                      └──► RenderEngine    (branding)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::numbering::{
    NumberTemplate, DEFAULT_NUMBER_TEMPLATE, DEFAULT_NUMBER_WIDTH, MAX_NUMBER_WIDTH,
};
use crate::types::{DocumentKind, TaxRate};
use crate::validation::{validate_hex_color, validate_tax_rate, ValidationResult};

/// Default accent color of rendered documents.
pub const DEFAULT_ACCENT_COLOR: &str = "#27AE60";

/// Company details printed on documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct Branding {
    pub company_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    /// Tax identifier (RFC, NIT, ...). Empty when not shown.
    pub tax_id: String,
    /// `#RRGGBB` accent used by the PDF renderer.
    pub accent_color: String,
    /// Name or role printed under the "Autorizado por" signature line.
    pub signer: String,
    /// Logo as a `data:image/...;base64,` URI. Empty for none.
    pub logo: String,
}

impl Default for Branding {
    fn default() -> Self {
        Branding {
            company_name: "BrianTech".to_string(),
            address: "Calle Principal #123, Ciudad".to_string(),
            phone: "(555) 123-4567".to_string(),
            email: "info@briantech.com".to_string(),
            tax_id: String::new(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            signer: "Gerente General".to_string(),
            logo: String::new(),
        }
    }
}

impl Branding {
    /// Whether a logo has been configured.
    pub fn has_logo(&self) -> bool {
        !self.logo.trim().is_empty()
    }
}

/// Settings snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct Settings {
    pub system_name: String,
    pub invoice_prefix: String,
    pub quotation_prefix: String,
    /// See [`crate::numbering`] for the syntax.
    pub number_template: String,
    /// Minimum digits of `{number}` when the template gives no width.
    pub number_width: u32,
    /// Applied when a request does not carry its own tax rate.
    pub default_tax: TaxRate,
    /// Last invoice counter value handed out. Advanced only by the store.
    pub last_invoice_number: u64,
    pub branding: Branding,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            system_name: "Sistema de Facturación".to_string(),
            invoice_prefix: "FAC".to_string(),
            quotation_prefix: "COT".to_string(),
            number_template: DEFAULT_NUMBER_TEMPLATE.to_string(),
            number_width: DEFAULT_NUMBER_WIDTH as u32,
            default_tax: TaxRate::from_bps(1600),
            last_invoice_number: 0,
            branding: Branding::default(),
        }
    }
}

impl Settings {
    /// Checks every field that could make numbering or rendering fail later.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.invoice_prefix.trim().is_empty() {
            return Err(ValidationError::required("invoice_prefix"));
        }
        if self.quotation_prefix.trim().is_empty() {
            return Err(ValidationError::required("quotation_prefix"));
        }

        NumberTemplate::parse(&self.number_template)?;

        if self.number_width == 0 || self.number_width as usize > MAX_NUMBER_WIDTH {
            return Err(ValidationError::OutOfRange {
                field: "number_width".to_string(),
                min: 1,
                max: MAX_NUMBER_WIDTH as i64,
            });
        }

        validate_tax_rate(self.default_tax)?;
        validate_hex_color("accent_color", &self.branding.accent_color)?;

        Ok(())
    }

    /// Parsed numbering template.
    pub fn template(&self) -> ValidationResult<NumberTemplate> {
        NumberTemplate::parse(&self.number_template)
    }

    /// Prefix used for the given kind of document.
    pub fn prefix_for(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Invoice => &self.invoice_prefix,
            DocumentKind::Quotation => &self.quotation_prefix,
        }
    }

    /// Formats a document number for `kind` with this snapshot's rules.
    pub fn format_number(&self, kind: DocumentKind, year: i32, counter: u64) -> ValidationResult<String> {
        let template = self.template()?;
        Ok(template.format(
            self.prefix_for(kind),
            year,
            counter,
            self.number_width as usize,
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.default_tax.bps(), 1600);
        assert_eq!(settings.branding.company_name, "BrianTech");
        assert!(!settings.branding.has_logo());
    }

    #[test]
    fn test_format_number() {
        let settings = Settings::default();
        assert_eq!(
            settings.format_number(DocumentKind::Invoice, 2026, 1).unwrap(),
            "FAC-2026-0001"
        );
        assert_eq!(
            settings.format_number(DocumentKind::Quotation, 2026, 15).unwrap(),
            "COT-2026-0015"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.number_template = "{prefix}-{year}".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.number_template = "{prefix}-{serie}-{number}".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.number_width = 0;
        assert!(settings.validate().is_err());
        settings.number_width = 13;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.branding.accent_color = "green".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.invoice_prefix = " ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"invoice_prefix":"F","branding":{"company_name":"ACME"}}"#).unwrap();
        assert_eq!(settings.invoice_prefix, "F");
        assert_eq!(settings.quotation_prefix, "COT");
        assert_eq!(settings.branding.company_name, "ACME");
        assert_eq!(settings.branding.accent_color, DEFAULT_ACCENT_COLOR);
    }
}
