//! # cotiza
//!
//! Command line front-end for invoices and quotations.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize logging (stderr, RUST_LOG)                               │
//! │  2. Cli::parse ─────────── usage error ──► clap prints it, exit 2       │
//! │  3. Load COTIZA_* config ─ invalid ──────► anyhow error                 │
//! │  4. Open SQLite, run migrations ─ fail ──► anyhow error                 │
//! │  5. App::run(command) ──── CliError ─────► stderr + exit code           │
//! │                       └─── Ok(text) ─────► stdout                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use cotiza_cli::args::Cli;
use cotiza_cli::config::CliConfig;
use cotiza_cli::error::ErrorCode;
use cotiza_cli::{init_tracing, App};
use cotiza_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let command = match Cli::parse().into_command() {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {}\n\nRun 'cotiza --help' for usage.", e);
            process::exit(e.exit_code());
        }
    };

    let config = CliConfig::load().context("Invalid configuration")?;
    debug!(db = %config.db_path.display(), output = %config.output_dir.display(), "Configuration loaded");

    let db_config = DbConfig::new(&config.db_path).max_connections(config.max_connections);
    let db = Database::new(db_config)
        .await
        .with_context(|| format!("Could not open database {}", config.db_path.display()))?;
    info!(db = %config.db_path.display(), "Database ready");

    let app = App::new(db.clone(), config);
    let result = app.run(command).await;
    db.close().await;

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("error: {}", e);
            if e.code == ErrorCode::Usage {
                eprintln!("\nRun 'cotiza --help' for usage.");
            }
            process::exit(e.exit_code());
        }
    }
}
