//! # cotiza-billing: Billing Workflow for Cotiza
//!
//! Orchestrates the domain of `cotiza-core` over any [`BillingStore`].
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BillingService<S>                                │
//! │   preview / commit invoices, quotations, conversion, reports            │
//! │            │                                  │                         │
//! │            ▼                                  ▼                         │
//! │   ┌──────────────────┐              ┌──────────────────┐               │
//! │   │   StockLedger    │              │  NumberSequencer │               │
//! │   │  get, adjust,    │              │  next_number,    │               │
//! │   │  receive, search │              │  peek            │               │
//! │   └────────┬─────────┘              └────────┬─────────┘               │
//! │            └──────────────┬──────────────────┘                          │
//! │                           ▼                                             │
//! │                  S: BillingStore                                        │
//! │         (cotiza-db::Database or MemoryStore)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use cotiza_billing::{BillingService, MemoryStore};
//! use cotiza_core::{InvoiceRequest, Money, Product, Quantity, TaxRate};
//! use cotiza_core::document::BillingDocument;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let store = MemoryStore::with_products([Product::new(
//!         "001",
//!         "Laptop Dell",
//!         Money::from_cents(85000),
//!         Quantity::from_units(10),
//!     )]);
//!     let billing = BillingService::new(store);
//!
//!     let request = InvoiceRequest::new("ACME")
//!         .with_tax(TaxRate::zero())
//!         .with_line("001", Quantity::from_units(3));
//!     let invoice = billing.commit_invoice(&request).await.unwrap();
//!
//!     assert_eq!(invoice.total().to_decimal_string(), "2550.00");
//! });
//! ```
//!
//! [`BillingStore`]: cotiza_core::store::BillingStore

pub mod ledger;
pub mod memory;
pub mod sequencer;
pub mod workflow;

pub use ledger::StockLedger;
pub use memory::MemoryStore;
pub use sequencer::NumberSequencer;
pub use workflow::BillingService;
