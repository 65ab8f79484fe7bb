//! # Command Line Parsing
//!
//! clap derives the grammar, help text and usage errors. [`Cli::into_command`]
//! then folds the parsed tree into a flat [`Command`] for [`crate::App::run`].
//!
//! ```text
//!   cotiza invoice create --client ACME --line 001:2 --line 005:1 --tax 16
//!          ───────┬─────── ──────────────────────┬──────────────────────
//!          Commands::Invoice               DocumentArgs
//!          InvoiceAction::Create           (value parsers from cotiza-core)
//!                 │                              │
//!                 └──────────────┬───────────────┘
//!                                ▼
//!   Cli::into_command ──► Command::InvoiceCreate(InvoiceRequest { .. })
//! ```
//!
//! Malformed values (`--line 001`, `--tax abc`, unknown settings) are
//! rejected by clap itself, which prints usage and exits with status 2.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use cotiza_core::{
    DocumentKind, InvoiceRequest, LineRequest, Money, ProductInput, Quantity, QuotationRequest,
    QuotationStatus, TaxRate,
};
use cotiza_render::{DEFAULT_FORMAT, DEFAULT_RENDERER};

use crate::error::{CliError, CliResult};

const ENVIRONMENT_HELP: &str = "\
Environment:
  COTIZA_DB_PATH, COTIZA_MAX_CONNECTIONS, COTIZA_OUTPUT_DIR,
  COTIZA_TAX_RATE, COTIZA_COMPANY_NAME, RUST_LOG";

// =============================================================================
// Grammar
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "cotiza")]
#[command(version, about = "Cotiza - facturas y cotizaciones")]
#[command(arg_required_else_help = true, after_help = ENVIRONMENT_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the product catalog
    Products {
        /// Only products whose code or name contains TEXT
        #[arg(short, long, value_name = "TEXT")]
        search: Option<String>,
    },
    /// Add, restock or remove products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Preview, issue and look up invoices
    Invoice {
        #[command(subcommand)]
        action: InvoiceAction,
    },
    /// Create quotations and convert them into invoices
    Quote {
        #[command(subcommand)]
        action: QuoteAction,
    },
    /// Write an invoice or quotation to a file
    Render {
        #[arg(value_enum)]
        kind: RenderKind,

        number: String,

        /// Output renderer (`texto`, `pdf`)
        #[arg(short, long, default_value = DEFAULT_RENDERER)]
        renderer: String,

        /// Paper format (`normal`, `termico`, `carta`)
        #[arg(short, long, default_value = DEFAULT_FORMAT)]
        format: String,
    },
    /// List renderers and paper formats
    Formats,
    /// Sales summary
    Report {
        #[arg(long)]
        json: bool,
    },
    /// Totals, stock alerts and recent activity
    Dashboard {
        #[arg(long)]
        json: bool,
    },
    /// Show or edit stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProductAction {
    /// Add a product to the catalog
    Add {
        code: String,

        name: String,

        #[arg(value_parser = Money::parse)]
        price: Money,

        /// Opening stock
        #[arg(value_parser = Quantity::parse)]
        stock: Quantity,

        /// Unit of sale, e.g. `pza` or `kg`
        #[arg(short, long)]
        unit: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Add to (or, with a negative DELTA, take from) the stock of a product
    Stock {
        code: String,

        #[arg(value_parser = Quantity::parse, allow_negative_numbers = true)]
        delta: Quantity,
    },
    /// Remove a product from the catalog
    Delete { code: String },
}

#[derive(Debug, Subcommand)]
pub enum InvoiceAction {
    /// Show the invoice without saving it or touching stock
    Preview(DocumentArgs),
    /// Issue the invoice and deduct stock
    Create(DocumentArgs),
    /// Number the next invoice will receive
    Next,
    /// List issued invoices
    List {
        /// Only clients whose name contains TEXT
        #[arg(short, long, value_name = "TEXT")]
        client: Option<String>,

        /// First day included (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,

        /// Last day included (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
    },
    Show { number: String },
    /// Delete an invoice. Stock is not restored.
    Delete { number: String },
}

#[derive(Debug, Subcommand)]
pub enum QuoteAction {
    /// Save a quotation under the next quotation number
    Create(DocumentArgs),
    /// Show a quotation without saving it
    Draft(DocumentArgs),
    /// Number the next quotation will receive
    Next,
    List,
    Show { number: String },
    /// Mark a quotation as accepted or rejected
    Status {
        number: String,

        #[arg(value_parser = QuotationStatus::parse)]
        status: QuotationStatus,
    },
    /// Issue an invoice from an accepted or pending quotation
    Convert { number: String },
    Delete { number: String },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    Show,
    /// Change one setting. `logo` takes an image file path, or `none`.
    Set {
        #[arg(value_parser = SettingKey::parse)]
        key: SettingKey,

        value: String,
    },
}

/// Options shared by invoice and quotation requests.
#[derive(Debug, Clone, Args)]
pub struct DocumentArgs {
    #[arg(short, long)]
    pub client: String,

    /// One line as CODE:QTY. Repeat for more lines.
    #[arg(short, long = "line", value_name = "CODE:QTY", value_parser = LineRequest::parse)]
    pub lines: Vec<LineRequest>,

    /// Tax percentage, e.g. `16` or `8.5`
    #[arg(short, long, value_parser = TaxRate::parse_percentage)]
    pub tax: Option<TaxRate>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Explicit document number instead of the next in sequence
    #[arg(long)]
    pub number: Option<String>,
}

/// Document kinds `render` accepts, in English or Spanish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderKind {
    #[value(alias = "factura")]
    Invoice,
    #[value(alias = "cotizacion")]
    Quote,
}

// =============================================================================
// Commands
// =============================================================================

/// A command ready to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Products { search: Option<String> },
    ProductAdd(ProductInput),
    ProductStock { code: String, delta: Quantity },
    ProductDelete { code: String },

    InvoicePreview(InvoiceRequest),
    InvoiceCreate(InvoiceRequest),
    InvoiceList(InvoiceFilter),
    InvoiceShow { number: String },
    InvoiceDelete { number: String },

    QuoteCreate(QuotationRequest),
    QuoteDraft(QuotationRequest),
    QuoteList,
    QuoteShow { number: String },
    QuoteStatus { number: String, status: QuotationStatus },
    QuoteConvert { number: String },
    QuoteDelete { number: String },

    NextNumber(DocumentKind),
    Render(RenderTarget),
    Formats,

    Report { json: bool },
    Dashboard { json: bool },

    SettingsShow,
    SettingsSet { key: SettingKey, value: String },
}

/// Filters of `invoice list`. Dates are whole local days, inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvoiceFilter {
    pub client: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// What `render` should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    pub kind: DocumentKind,
    pub number: String,
    pub renderer: String,
    pub format: String,
}

/// Settings editable through `settings set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    SystemName,
    InvoicePrefix,
    QuotationPrefix,
    NumberTemplate,
    NumberWidth,
    DefaultTax,
    CompanyName,
    Address,
    Phone,
    Email,
    TaxId,
    AccentColor,
    Signer,
    Logo,
}

impl SettingKey {
    pub const ALL: [(&'static str, SettingKey); 14] = [
        ("system_name", SettingKey::SystemName),
        ("invoice_prefix", SettingKey::InvoicePrefix),
        ("quotation_prefix", SettingKey::QuotationPrefix),
        ("number_template", SettingKey::NumberTemplate),
        ("number_width", SettingKey::NumberWidth),
        ("default_tax", SettingKey::DefaultTax),
        ("company_name", SettingKey::CompanyName),
        ("address", SettingKey::Address),
        ("phone", SettingKey::Phone),
        ("email", SettingKey::Email),
        ("tax_id", SettingKey::TaxId),
        ("accent_color", SettingKey::AccentColor),
        ("signer", SettingKey::Signer),
        ("logo", SettingKey::Logo),
    ];

    /// Accepts `invoice_prefix` and `invoice-prefix`, in any case.
    pub fn parse(input: &str) -> CliResult<Self> {
        let wanted = input.trim().to_ascii_lowercase().replace('-', "_");
        SettingKey::ALL
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, key)| *key)
            .ok_or_else(|| {
                let names: Vec<&str> = SettingKey::ALL.iter().map(|(name, _)| *name).collect();
                CliError::usage(format!("Unknown setting '{}'. Expected one of: {}", input, names.join(", ")))
            })
    }

    pub fn name(&self) -> &'static str {
        SettingKey::ALL
            .iter()
            .find(|(_, key)| key == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl Cli {
    /// Folds the parsed tree into a [`Command`].
    ///
    /// Only checks that span several options are left here; clap has
    /// already rejected anything malformed.
    pub fn into_command(self) -> CliResult<Command> {
        Ok(match self.command {
            Commands::Products { search } => Command::Products { search },
            Commands::Product { action } => match action {
                ProductAction::Add {
                    code,
                    name,
                    price,
                    stock,
                    unit,
                    description,
                } => {
                    let mut input = ProductInput::new(code, name, price, stock);
                    if let Some(unit) = unit {
                        input = input.with_unit(unit);
                    }
                    if let Some(description) = description {
                        input = input.with_description(description);
                    }
                    Command::ProductAdd(input)
                }
                ProductAction::Stock { code, delta } => Command::ProductStock { code, delta },
                ProductAction::Delete { code } => Command::ProductDelete { code },
            },
            Commands::Invoice { action } => match action {
                InvoiceAction::Preview(fields) => Command::InvoicePreview(fields.into_invoice()),
                InvoiceAction::Create(fields) => Command::InvoiceCreate(fields.into_invoice()),
                InvoiceAction::Next => Command::NextNumber(DocumentKind::Invoice),
                InvoiceAction::List { client, from, to } => {
                    if let (Some(from), Some(to)) = (from, to) {
                        if from > to {
                            return Err(CliError::usage("--from must not be after --to"));
                        }
                    }
                    Command::InvoiceList(InvoiceFilter { client, from, to })
                }
                InvoiceAction::Show { number } => Command::InvoiceShow { number },
                InvoiceAction::Delete { number } => Command::InvoiceDelete { number },
            },
            Commands::Quote { action } => match action {
                QuoteAction::Create(fields) => Command::QuoteCreate(fields.into_quotation()),
                QuoteAction::Draft(fields) => Command::QuoteDraft(fields.into_quotation()),
                QuoteAction::Next => Command::NextNumber(DocumentKind::Quotation),
                QuoteAction::List => Command::QuoteList,
                QuoteAction::Show { number } => Command::QuoteShow { number },
                QuoteAction::Status { number, status } => Command::QuoteStatus { number, status },
                QuoteAction::Convert { number } => Command::QuoteConvert { number },
                QuoteAction::Delete { number } => Command::QuoteDelete { number },
            },
            Commands::Render {
                kind,
                number,
                renderer,
                format,
            } => Command::Render(RenderTarget {
                kind: match kind {
                    RenderKind::Invoice => DocumentKind::Invoice,
                    RenderKind::Quote => DocumentKind::Quotation,
                },
                number,
                renderer,
                format,
            }),
            Commands::Formats => Command::Formats,
            Commands::Report { json } => Command::Report { json },
            Commands::Dashboard { json } => Command::Dashboard { json },
            Commands::Settings { action } => match action {
                SettingsAction::Show => Command::SettingsShow,
                SettingsAction::Set { key, value } => Command::SettingsSet { key, value },
            },
        })
    }
}

impl DocumentArgs {
    fn into_invoice(self) -> InvoiceRequest {
        let mut request = InvoiceRequest::new(self.client);
        request.lines = self.lines;
        request.tax = self.tax;
        request.notes = self.notes;
        request.number = self.number;
        request
    }

    fn into_quotation(self) -> QuotationRequest {
        let mut request = QuotationRequest::new(self.client);
        request.lines = self.lines;
        request.tax = self.tax;
        request.notes = self.notes;
        request.number = self.number;
        request
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| format!("'{}' is not a YYYY-MM-DD date", input))
}

// =============================================================================
// Unit Tests
// =============================================================================
