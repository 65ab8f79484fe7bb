//! # cotiza-db: Database Layer for Cotiza
//!
//! SQLite storage for the catalog, invoices, quotations and settings,
//! using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cotiza Data Flow                                │
//! │                                                                         │
//! │  BillingService<Database>  (cotiza-billing)                            │
//! │       │  store traits from cotiza-core                                  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cotiza-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ InvoiceRepo    │    │ 001_initial_ │  │   │
//! │  │   │ store.rs      │    │ QuotationRepo  │    │   schema.sql │  │   │
//! │  │   │ trait impls   │    │ SettingsRepo   │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (./cotiza.db by default)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Billing code never calls the repositories directly: it goes through the
//! `cotiza-core` store traits that [`Database`] implements. The repositories
//! stay public for the seed binary and for tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cotiza_billing::BillingService;
//! use cotiza_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./cotiza.db")).await?;
//! let billing = BillingService::new(db);
//! let invoice = billing.commit_invoice(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig, DbLocation};

pub use repository::invoice::InvoiceRepository;
pub use repository::product::ProductRepository;
pub use repository::quotation::QuotationRepository;
pub use repository::settings::SettingsRepository;
