//! # Settings Commands
//!
//! `settings show` prints the stored settings as JSON (the logo is shown
//! by size only). `settings set KEY VALUE` edits one field, then the whole
//! record is validated and saved. The invoice counter is never written
//! here.
//!
//! A logo is given as an image file path and stored as a base64 data URI.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};

use cotiza_core::store::BillingStore;
use cotiza_core::TaxRate;

use crate::args::SettingKey;
use crate::error::{CliError, CliResult};
use crate::App;

pub async fn show<S: BillingStore>(app: &App<S>) -> CliResult<String> {
    let mut settings = app.billing().settings().await?;
    if settings.branding.has_logo() {
        settings.branding.logo = format!("<data URI, {} bytes>", settings.branding.logo.len());
    }

    let mut out = serde_json::to_string_pretty(&settings)?;
    let config = app.config();
    if config.tax_rate.is_some() || config.company_name.is_some() {
        out.push_str("\n(COTIZA_TAX_RATE / COTIZA_COMPANY_NAME overrides are active for this process)");
    }
    Ok(out)
}

pub async fn set<S: BillingStore>(app: &App<S>, key: SettingKey, value: &str) -> CliResult<String> {
    let mut settings = app.billing().settings().await?;
    let text = value.trim().to_string();
    let branding = &mut settings.branding;

    match key {
        SettingKey::SystemName => settings.system_name = text,
        SettingKey::InvoicePrefix => settings.invoice_prefix = text,
        SettingKey::QuotationPrefix => settings.quotation_prefix = text,
        SettingKey::NumberTemplate => settings.number_template = text,
        SettingKey::NumberWidth => {
            settings.number_width = text
                .parse()
                .map_err(|_| CliError::validation(format!("number_width must be a whole number, got '{}'", value)))?
        }
        SettingKey::DefaultTax => {
            settings.default_tax = TaxRate::parse_percentage(&text).map_err(|e| CliError::validation(e.to_string()))?
        }
        SettingKey::CompanyName => branding.company_name = text,
        SettingKey::Address => branding.address = text,
        SettingKey::Phone => branding.phone = text,
        SettingKey::Email => branding.email = text,
        SettingKey::TaxId => branding.tax_id = text,
        SettingKey::AccentColor => branding.accent_color = text.to_ascii_uppercase(),
        SettingKey::Signer => branding.signer = text,
        SettingKey::Logo => branding.logo = logo_data_uri(&text)?,
    }

    app.billing().update_settings(&settings).await?;
    Ok(format!("Setting {} updated", key.name()))
}

/// Reads an image file into a data URI. `none` or an empty value clears it.
fn logo_data_uri(value: &str) -> CliResult<String> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(String::new());
    }

    let path = Path::new(value);
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => {
            return Err(CliError::validation(format!(
                "Logo must be a .png, .jpg or .gif file, got '{}'",
                value
            )))
        }
    };

    let bytes = fs::read(path)?;
    Ok(format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes)))
}

// =============================================================================
// Unit Tests
// =============================================================================
