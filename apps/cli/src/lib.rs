//! # Cotiza CLI Library
//!
//! Everything the `cotiza` binary does, kept out of `main.rs` so commands
//! can be exercised against an in-memory store.
//!
//! ## Module Organization
//! ```text
//! cotiza_cli/
//! ├── lib.rs          ◄─── You are here (App, dispatch, tracing setup)
//! ├── args.rs         ◄─── clap grammar → Command
//! ├── config.rs       ◄─── COTIZA_* environment variables
//! ├── error.rs        ◄─── CliError and exit codes
//! └── commands/
//!     ├── mod.rs      ◄─── Shared table formatting
//!     ├── product.rs  ◄─── Catalog and stock
//!     ├── invoice.rs  ◄─── Preview, commit, list, show, delete
//!     ├── quotation.rs◄─── Create, draft, status, convert
//!     ├── render.rs   ◄─── Files through the render engine
//!     ├── report.rs   ◄─── Sales summary and dashboard
//!     └── settings.rs ◄─── Show and edit settings
//! ```
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  argv ──► Cli::parse ──► into_command ──► App::run ──► commands::*      │
//! │                                          │                              │
//! │                      ┌───────────────────┼───────────────────┐          │
//! │                      ▼                   ▼                   ▼          │
//! │               BillingService       RenderEngine          CliConfig      │
//! │               (any BillingStore)   (texto, pdf)          (overrides)    │
//! │                                                                         │
//! │  Ok(String)  ──► stdout                                                 │
//! │  Err(CliError) ──► stderr + exit code                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod args;
pub mod commands;
pub mod config;
pub mod error;

use tracing_subscriber::EnvFilter;

use cotiza_billing::BillingService;
use cotiza_core::store::BillingStore;
use cotiza_core::{Settings, TaxRate};
use cotiza_render::RenderEngine;

use args::Command;
use config::CliConfig;
use error::CliResult;

/// Initializes the global tracing subscriber.
///
/// Logs go to stderr so command output on stdout stays clean. Default
/// filter: `info,cotiza=debug,sqlx=warn`, overridable with `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cotiza=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Billing service, render engine and configuration for one process.
pub struct App<S> {
    billing: BillingService<S>,
    engine: RenderEngine,
    config: CliConfig,
}

impl<S: BillingStore> App<S> {
    pub fn new(store: S, config: CliConfig) -> Self {
        App {
            billing: BillingService::new(store),
            engine: RenderEngine::new(),
            config,
        }
    }

    /// Replaces the render engine, e.g. one with extra formats registered.
    pub fn with_engine(mut self, engine: RenderEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn billing(&self) -> &BillingService<S> {
        &self.billing
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Stored settings with the environment overrides applied.
    pub async fn effective_settings(&self) -> CliResult<Settings> {
        let settings = self.billing.settings().await?;
        Ok(self.config.apply(settings))
    }

    /// Tax for requests that carry none: the environment override, else
    /// `None` so the stored default applies.
    pub(crate) fn tax_override(&self) -> Option<TaxRate> {
        self.config.tax_rate
    }

    /// Executes a command and returns what should be printed.
    pub async fn run(&self, command: Command) -> CliResult<String> {
        use commands::{invoice, product, quotation, render, report, settings};

        match command {
            Command::Products { search } => product::list(self, search.as_deref()).await,
            Command::ProductAdd(input) => product::add(self, input).await,
            Command::ProductStock { code, delta } => product::adjust(self, &code, delta).await,
            Command::ProductDelete { code } => product::delete(self, &code).await,

            Command::InvoicePreview(request) => invoice::preview(self, request).await,
            Command::InvoiceCreate(request) => invoice::create(self, request).await,
            Command::InvoiceList(filter) => invoice::list(self, &filter).await,
            Command::InvoiceShow { number } => invoice::show(self, &number).await,
            Command::InvoiceDelete { number } => invoice::delete(self, &number).await,

            Command::QuoteCreate(request) => quotation::create(self, request).await,
            Command::QuoteDraft(request) => quotation::draft(self, request).await,
            Command::QuoteList => quotation::list(self).await,
            Command::QuoteShow { number } => quotation::show(self, &number).await,
            Command::QuoteStatus { number, status } => quotation::set_status(self, &number, status).await,
            Command::QuoteConvert { number } => quotation::convert(self, &number).await,
            Command::QuoteDelete { number } => quotation::delete(self, &number).await,

            Command::NextNumber(kind) => Ok(self.billing.sequencer().peek(kind).await?),
            Command::Render(target) => render::render(self, &target).await,
            Command::Formats => Ok(render::formats(self)),

            Command::Report { json } => report::summary(self, json).await,
            Command::Dashboard { json } => report::dashboard(self, json).await,

            Command::SettingsShow => settings::show(self).await,
            Command::SettingsSet { key, value } => settings::set(self, key, &value).await,
        }
    }
}
