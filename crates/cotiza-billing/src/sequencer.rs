//! # Numbering Sequencer
//!
//! Allocates document numbers.
//!
//! ## Two Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Invoice                                                                │
//! │    advance_invoice_counter()   UPDATE ... + 1 RETURNING (atomic)       │
//! │         │ counter is durable before the number is formatted            │
//! │         ▼                                                               │
//! │    format(invoice_prefix, year, counter)   → FAC-2026-0008              │
//! │                                                                         │
//! │  Quotation                                                              │
//! │    count_quotations() + 1      read-then-format, NOT race-safe          │
//! │         │ skips forward while the number is taken                       │
//! │         ▼                                                               │
//! │    format(quotation_prefix, year, n)       → COT-2026-0003              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The quotation path exists because quotation numbers were always derived
//! from the row count. Two concurrent creators can compute the same number;
//! the later upsert then replaces the earlier quotation.
//! TODO: move quotations onto a stored counter like invoices once existing
//! numbering can be migrated.

use chrono::{Datelike, Utc};
use tracing::debug;

use cotiza_core::store::{QuotationStore, SettingsStore};
use cotiza_core::{CoreResult, DocumentKind, Settings};

/// How far past count + 1 to look for a free quotation number.
const MAX_QUOTATION_ATTEMPTS: u64 = 1000;

/// Document number allocator.
pub struct NumberSequencer<'a, S> {
    store: &'a S,
}

impl<'a, S: SettingsStore + QuotationStore> NumberSequencer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        NumberSequencer { store }
    }

    /// Allocates the next number for `kind`.
    ///
    /// For invoices the stored counter is advanced even if the caller never
    /// uses the number, so numbers are unique but may have gaps.
    pub async fn next_number(&self, kind: DocumentKind) -> CoreResult<String> {
        let settings = self.store.load_settings().await?;
        // Reject a broken template before the counter moves.
        settings.template()?;

        let number = match kind {
            DocumentKind::Invoice => {
                let counter = self.store.advance_invoice_counter().await?;
                settings.format_number(kind, current_year(), counter)?
            }
            DocumentKind::Quotation => self.free_quotation_number(&settings).await?,
        };

        debug!(kind = %kind, number = %number, "Allocated document number");
        Ok(number)
    }

    /// Formats the number the next call to [`Self::next_number`] would
    /// return, without advancing anything.
    pub async fn peek(&self, kind: DocumentKind) -> CoreResult<String> {
        let settings = self.store.load_settings().await?;
        match kind {
            DocumentKind::Invoice => {
                Ok(settings.format_number(kind, current_year(), settings.last_invoice_number + 1)?)
            }
            DocumentKind::Quotation => self.free_quotation_number(&settings).await,
        }
    }

    async fn free_quotation_number(&self, settings: &Settings) -> CoreResult<String> {
        let base = self.store.count_quotations().await? as u64 + 1;
        let year = current_year();

        let mut candidate = settings.format_number(DocumentKind::Quotation, year, base)?;
        for offset in 1..=MAX_QUOTATION_ATTEMPTS {
            if self.store.find_quotation(&candidate).await?.is_none() {
                break;
            }
            candidate = settings.format_number(DocumentKind::Quotation, year, base + offset)?;
        }
        Ok(candidate)
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}

// =============================================================================
// Unit Tests
// =============================================================================
