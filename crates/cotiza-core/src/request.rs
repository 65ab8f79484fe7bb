//! # Requests
//!
//! Typed inputs accepted by the billing workflow and the stock ledger.
//!
//! ## Flow
//! ```text
//! caller text / JSON
//!        │  serde or LineRequest::parse("001:3")
//!        ▼
//! InvoiceRequest / QuotationRequest / ProductInput
//!        │  .validate()   ← field rules from validation.rs
//!        ▼
//! BillingService / StockLedger   ← existence and stock checks
//! ```
//!
//! A request that passed `validate()` still references product codes that
//! may not exist; resolving them is the workflow's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{Product, TaxRate};
use crate::validation::{
    validate_client, validate_code, validate_document_number, validate_price,
    validate_product_name, validate_quantity, validate_stock, validate_tax_rate, validate_unit,
    ValidationResult,
};
use crate::DEFAULT_UNIT;

// =============================================================================
// Line Requests
// =============================================================================

/// One requested `(code, quantity)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineRequest {
    pub code: String,
    pub quantity: Quantity,
}

impl LineRequest {
    pub fn new(code: impl Into<String>, quantity: Quantity) -> Self {
        LineRequest {
            code: code.into(),
            quantity,
        }
    }

    /// Parses the `CODE:QTY` shorthand used on the command line.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::request::LineRequest;
    ///
    /// let line = LineRequest::parse("002:2.5").unwrap();
    /// assert_eq!(line.code, "002");
    /// assert_eq!(line.quantity.milli(), 2500);
    /// assert!(LineRequest::parse("002").is_err());
    /// ```
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let (code, qty) = input.split_once(':').ok_or_else(|| {
            ValidationError::invalid_format("line", format!("'{}' is not CODE:QTY", input))
        })?;
        let line = LineRequest::new(code.trim(), Quantity::parse(qty)?);
        line.validate()?;
        Ok(line)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_code(&self.code)?;
        validate_quantity(self.quantity)
    }
}

fn validate_lines(lines: &[LineRequest]) -> ValidationResult<()> {
    lines.iter().try_for_each(LineRequest::validate)
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Document Requests
// =============================================================================

/// Input for previewing or committing an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct InvoiceRequest {
    /// Explicit number. `None` lets the sequencer allocate one.
    pub number: Option<String>,
    pub client: String,
    /// Overrides the settings default when present.
    pub tax: Option<TaxRate>,
    pub notes: Option<String>,
    /// Backdated issue date. `None` means now.
    #[ts(as = "Option<String>")]
    pub issued_at: Option<DateTime<Utc>>,
    pub lines: Vec<LineRequest>,
}

impl InvoiceRequest {
    pub fn new(client: impl Into<String>) -> Self {
        InvoiceRequest {
            client: client.into(),
            ..Default::default()
        }
    }

    pub fn with_line(mut self, code: impl Into<String>, quantity: Quantity) -> Self {
        self.lines.push(LineRequest::new(code, quantity));
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_tax(mut self, tax: TaxRate) -> Self {
        self.tax = Some(tax);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Field checks. An empty line list is not an error here.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_client(&self.client)?;
        if let Some(number) = &self.number {
            validate_document_number(number)?;
        }
        if let Some(tax) = self.tax {
            validate_tax_rate(tax)?;
        }
        validate_lines(&self.lines)
    }

    /// Trimmed notes, `None` when blank.
    pub fn clean_notes(&self) -> Option<String> {
        blank_to_none(self.notes.clone())
    }
}

/// Input for creating or drafting a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct QuotationRequest {
    pub number: Option<String>,
    pub client: String,
    pub tax: Option<TaxRate>,
    pub notes: Option<String>,
    #[ts(as = "Option<String>")]
    pub issued_at: Option<DateTime<Utc>>,
    pub lines: Vec<LineRequest>,
}

impl QuotationRequest {
    pub fn new(client: impl Into<String>) -> Self {
        QuotationRequest {
            client: client.into(),
            ..Default::default()
        }
    }

    pub fn with_line(mut self, code: impl Into<String>, quantity: Quantity) -> Self {
        self.lines.push(LineRequest::new(code, quantity));
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_tax(mut self, tax: TaxRate) -> Self {
        self.tax = Some(tax);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_client(&self.client)?;
        if let Some(number) = &self.number {
            validate_document_number(number)?;
        }
        if let Some(tax) = self.tax {
            validate_tax_rate(tax)?;
        }
        validate_lines(&self.lines)
    }

    pub fn clean_notes(&self) -> Option<String> {
        blank_to_none(self.notes.clone())
    }
}

// =============================================================================
// Product Input
// =============================================================================

/// Input for creating or fully replacing a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub code: String,
    pub name: String,
    pub unit_price: Money,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to `"unidad"`.
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub stock: Quantity,
}

impl ProductInput {
    pub fn new(code: impl Into<String>, name: impl Into<String>, unit_price: Money, stock: Quantity) -> Self {
        ProductInput {
            code: code.into(),
            name: name.into(),
            unit_price,
            description: None,
            unit: None,
            stock,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates every field and builds the product.
    pub fn into_product(self) -> ValidationResult<Product> {
        validate_code(&self.code)?;
        validate_product_name(&self.name)?;
        validate_price(self.unit_price)?;
        validate_stock(self.stock)?;

        let unit = blank_to_none(self.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string());
        validate_unit(&unit)?;

        Ok(Product {
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            unit_price: self.unit_price,
            description: blank_to_none(self.description),
            unit,
            stock: self.stock,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_request_parse() {
        let line = LineRequest::parse("001:3").unwrap();
        assert_eq!(line, LineRequest::new("001", Quantity::from_units(3)));

        assert!(LineRequest::parse("001").is_err());
        assert!(LineRequest::parse("001:0").is_err());
        assert!(LineRequest::parse(":3").is_err());
        assert!(LineRequest::parse("001:tres").is_err());
    }

    #[test]
    fn test_invoice_request_validate() {
        let request = InvoiceRequest::new("ACME").with_line("001", Quantity::from_units(1));
        assert!(request.validate().is_ok());

        assert!(InvoiceRequest::new("").validate().is_err());

        let request = InvoiceRequest::new("ACME").with_line("001", Quantity::zero());
        assert!(request.validate().is_err());

        let request = InvoiceRequest::new("ACME").with_tax(TaxRate::from_bps(20000));
        assert!(request.validate().is_err());

        // Empty line lists are rejected by the workflow, not here.
        assert!(InvoiceRequest::new("ACME").validate().is_ok());
    }

    #[test]
    fn test_quotation_request_notes() {
        let request = QuotationRequest::new("ACME").with_notes("   ");
        assert_eq!(request.clean_notes(), None);

        let request = QuotationRequest::new("ACME").with_notes(" Válida 15 días ");
        assert_eq!(request.clean_notes().as_deref(), Some("Válida 15 días"));
    }

    #[test]
    fn test_product_input_into_product() {
        let product = ProductInput::new(" 001 ", "Laptop Dell", Money::from_cents(85000), Quantity::from_units(10))
            .into_product()
            .unwrap();
        assert_eq!(product.code, "001");
        assert_eq!(product.unit, DEFAULT_UNIT);
        assert!(product.tracks_stock());

        let service = ProductInput::new("SRV", "Instalación", Money::from_cents(5000), Quantity::zero())
            .with_unit("hora")
            .into_product()
            .unwrap();
        assert!(!service.tracks_stock());

        assert!(ProductInput::new("", "X", Money::zero(), Quantity::zero()).into_product().is_err());
        assert!(ProductInput::new("X", "", Money::zero(), Quantity::zero()).into_product().is_err());
        assert!(ProductInput::new("X", "X", Money::from_cents(-1), Quantity::zero()).into_product().is_err());
        assert!(ProductInput::new("X", "X", Money::zero(), Quantity::from_units(-1)).into_product().is_err());
    }

    #[test]
    fn test_request_json_defaults() {
        let request: InvoiceRequest = serde_json::from_str(
            r#"{"client":"ACME","lines":[{"code":"001","quantity":3000}]}"#,
        )
        .unwrap();
        assert_eq!(request.number, None);
        assert_eq!(request.tax, None);
        assert_eq!(request.lines[0].quantity, Quantity::from_units(3));
    }
}
