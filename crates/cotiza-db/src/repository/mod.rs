//! # Repository Module
//!
//! SQL for each stored entity, one repository per table group.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database                                                               │
//! │  ├── products()    ProductRepository    products                       │
//! │  ├── invoices()    InvoiceRepository    invoices + invoice_lines       │
//! │  ├── quotations()  QuotationRepository  quotations + quotation_lines   │
//! │  └── settings()    SettingsRepository   settings (single row)          │
//! │                                                                         │
//! │  lines.rs          shared line-item rows for both document tables      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories speak `DbResult`. The store trait implementations in
//! `store.rs` translate to the workflow's vocabulary.

pub mod invoice;
pub mod lines;
pub mod product;
pub mod quotation;
pub mod settings;
