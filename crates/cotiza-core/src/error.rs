//! # Error Types
//!
//! Domain-specific error types for cotiza-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cotiza-core errors (this file)                                        │
//! │  ├── CoreError        - Business outcomes of billing operations        │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── StoreError       - Opaque repository failure                      │
//! │                                                                         │
//! │  cotiza-db errors (separate crate)                                     │
//! │  └── DbError          - SQLite failures, converted into StoreError     │
//! │                                                                         │
//! │  cotiza-render errors (separate crate)                                 │
//! │  └── RenderError      - Unknown renderer/format, PDF failures          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← StoreError ← DbError              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Expected vs. Fatal
//! Validation, not-found, conflict and insufficient-stock errors are normal
//! business outcomes: they are returned to the caller verbatim and nothing
//! was mutated. A [`StoreError`] is fatal for the current request only and
//! should be reported to the caller as a generic internal failure.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors produced by billing operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Product code is not in the catalog.
    ///
    /// ## When This Occurs
    /// - A requested line references an unknown code
    /// - A quotation line references a product deleted since it was quoted
    /// - `adjust` on a code that does not exist
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A product with this code already exists.
    ///
    /// ## When This Occurs
    /// - `create` with a code that is already in the catalog
    ///   (`upsert` replaces instead)
    #[error("Product already exists: {0}")]
    ProductExists(String),

    /// Invoice number is not stored.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Quotation number is not stored.
    #[error("Quotation not found: {0}")]
    QuotationNotFound(String),

    /// Requested quantity exceeds the available stock.
    ///
    /// ## When This Occurs
    /// - Preview or commit of an invoice line larger than the stock
    /// - Conversion of a quotation whose catalog stock has drifted
    /// - A conditional stock decrement lost a race at the storage layer
    ///
    /// The whole batch is aborted; no line was applied.
    #[error("Insufficient stock for {name} ({code}): available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        name: String,
        available: String,
        requested: String,
    },

    /// A document with this number is already stored.
    #[error("{kind} '{number}' already exists")]
    DuplicateDocument { kind: String, number: String },

    /// The quotation has already been converted into an invoice.
    ///
    /// ## When This Occurs
    /// - Second conversion attempt of the same quotation
    /// - Overwriting or re-statusing an invoiced quotation
    #[error("Quotation {0} has already been invoiced")]
    AlreadyInvoiced(String),

    /// Quotation status change that the lifecycle does not allow.
    #[error("Quotation {number} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        number: String,
        from: String,
        to: String,
    },

    /// A document with zero line items cannot be persisted.
    #[error("{0} has no line items")]
    EmptyDocument(String),

    /// The repository failed (connection lost, query error, ...).
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Returns true for expected business outcomes (validation, not found,
    /// conflicts, stock). Returns false for infrastructure failures.
    pub fn is_business(&self) -> bool {
        !matches!(self, CoreError::Store(_))
    }

    /// Returns true for the conflict family (duplicate number or code, already
    /// invoiced, forbidden status transition).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicateDocument { .. }
                | CoreError::ProductExists(_)
                | CoreError::AlreadyInvoiced(_)
                | CoreError::InvalidStatusTransition { .. }
        )
    }

    /// Returns true when an entity could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_)
                | CoreError::InvoiceNotFound(_)
                | CoreError::QuotationNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed number, unknown template placeholder).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Store Error
// =============================================================================

/// Opaque failure reported by a store implementation.
///
/// The core never inspects the cause; it only propagates it so the boundary
/// can log it and answer with a generic internal error.
#[derive(Debug, Error)]
#[error("Store failure during {operation}: {message}")]
pub struct StoreError {
    /// What the store was doing ("adjust stock", "commit invoice", ...).
    pub operation: String,
    /// Implementation-specific detail, for logs only.
    pub message: String,
}

impl StoreError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "001".to_string(),
            name: "Laptop Dell".to_string(),
            available: "10.00".to_string(),
            requested: "15.00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Laptop Dell (001): available 10.00, requested 15.00"
        );

        let err = CoreError::AlreadyInvoiced("COT-2026-0001".to_string());
        assert_eq!(
            err.to_string(),
            "Quotation COT-2026-0001 has already been invoiced"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("client");
        assert_eq!(err.to_string(), "client is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("code").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(core_err.is_business());
    }

    #[test]
    fn test_error_classification() {
        let store: CoreError = StoreError::new("list invoices", "disk I/O error").into();
        assert!(!store.is_business());
        assert!(!store.is_conflict());

        assert!(CoreError::AlreadyInvoiced("Q".into()).is_conflict());
        assert!(CoreError::DuplicateDocument {
            kind: "Invoice".into(),
            number: "FAC-1".into()
        }
        .is_conflict());
        assert!(CoreError::ProductExists("001".into()).is_conflict());
        assert!(CoreError::ProductNotFound("999".into()).is_not_found());
        assert!(!CoreError::EmptyDocument("Invoice".into()).is_not_found());
    }
}
