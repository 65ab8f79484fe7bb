//! # Validation Module
//!
//! Input validation utilities for Cotiza.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request types (request.rs)                                   │
//! │  ├── Text → Money / Quantity / TaxRate parsing                         │
//! │  └── Calls into THIS MODULE for every field                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Billing workflow (cotiza-billing)                            │
//! │  ├── Existence of product codes                                        │
//! │  └── Stock sufficiency                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  ├── UNIQUE document numbers                                           │
//! │  └── Foreign key constraints on line tables                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use cotiza_core::validation::{validate_code, validate_quantity};
//! use cotiza_core::quantity::Quantity;
//!
//! validate_code("001").unwrap();
//! validate_quantity(Quantity::from_units(3)).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::TaxRate;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest quantity on one line or in one stock movement.
pub const MAX_QUANTITY: Quantity = Quantity::from_units(1_000_000);

/// Largest stock level a product can be created with.
pub const MAX_STOCK: Quantity = Quantity::from_units(1_000_000_000);

/// Largest unit price, 100 000 000.00.
///
/// With [`MAX_QUANTITY`] a single line stays below 10^16 cents.
pub const MAX_PRICE: Money = Money::from_cents(10_000_000_000);

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use cotiza_core::validation::validate_code;
///
/// assert!(validate_code("001").is_ok());
/// assert!(validate_code("CBL-HDMI_2m").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("with space").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }

    if code.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "code",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates a product name (1 to 200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, 200)
}

/// Validates a client name (1 to 200 characters after trimming).
pub fn validate_client(client: &str) -> ValidationResult<()> {
    validate_text("client", client, 200)
}

/// Validates a unit label such as `"unidad"`, `"kg"` or `"hora"`.
pub fn validate_unit(unit: &str) -> ValidationResult<()> {
    validate_text("unit", unit, 30)
}

/// Validates a document number supplied by the caller.
pub fn validate_document_number(number: &str) -> ValidationResult<()> {
    validate_text("number", number, 64)
}

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (matches everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a `#RRGGBB` color.
pub fn validate_hex_color(field: &str, color: &str) -> ValidationResult<()> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(ValidationError::invalid_format(field, "expected a #RRGGBB color"));
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line or receipt quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - At most [`MAX_QUANTITY`]
///
/// ```text
/// "3"        → Quantity(3000) → ok
/// "0"        → Quantity(0)    → MustBePositive
/// "-2"       → Quantity(-2000)→ MustBePositive
/// "2000000"  → above the limit → OutOfRange
/// ```
pub fn validate_quantity(qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(out_of_range_units("quantity", MAX_QUANTITY));
    }

    Ok(())
}

/// Validates a signed stock movement: at most [`MAX_QUANTITY`] either way.
pub fn validate_stock_delta(delta: Quantity) -> ValidationResult<()> {
    if delta > MAX_QUANTITY || delta < -MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -(MAX_QUANTITY.milli() / Quantity::SCALE),
            max: MAX_QUANTITY.milli() / Quantity::SCALE,
        });
    }

    Ok(())
}

/// Validates a stock level on product creation (zero allowed, at most
/// [`MAX_STOCK`]).
pub fn validate_stock(stock: Quantity) -> ValidationResult<()> {
    if stock.is_negative() || stock > MAX_STOCK {
        return Err(out_of_range_units("stock", MAX_STOCK));
    }

    Ok(())
}

fn out_of_range_units(field: &str, max: Quantity) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: max.milli() / Quantity::SCALE,
    }
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - At most [`MAX_PRICE`]
///
/// ## Example
/// ```rust
/// use cotiza_core::money::Money;
/// use cotiza_core::validation::validate_price;
///
/// assert!(validate_price(Money::from_cents(1099)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());
/// assert!(validate_price(Money::from_cents(-100)).is_err());
/// assert!(validate_price(Money::from_cents(10_000_000_001)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE.dollars(),
        });
    }

    Ok(())
}

/// Validates a tax rate.
///
/// ## Rules
/// - Must be between 0 and 10000 bps (0% to 100%)
pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.bps() > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
