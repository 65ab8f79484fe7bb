//! # CLI Configuration
//!
//! Loaded from environment variables with fallback to defaults.
//!
//! | Variable                 | Default       | Meaning                              |
//! |--------------------------|---------------|--------------------------------------|
//! | `COTIZA_DB_PATH`         | `./cotiza.db` | SQLite file                          |
//! | `COTIZA_MAX_CONNECTIONS` | `5`           | Pool size                            |
//! | `COTIZA_OUTPUT_DIR`      | `.`           | Where rendered files are written     |
//! | `COTIZA_TAX_RATE`        | (stored)      | Percentage overriding the default    |
//! | `COTIZA_COMPANY_NAME`    | (stored)      | Company name printed on documents    |
//!
//! Business settings (prefixes, template, branding) live in the database;
//! the two overrides only apply to the current process.

use std::env;
use std::path::PathBuf;

use cotiza_core::validation::validate_tax_rate;
use cotiza_core::{Settings, TaxRate};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Maximum pooled connections
    pub max_connections: u32,

    /// Directory rendered documents are written to
    pub output_dir: PathBuf,

    /// Overrides the stored default tax rate
    pub tax_rate: Option<TaxRate>,

    /// Overrides the stored company name on rendered documents
    pub company_name: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db_path: PathBuf::from("./cotiza.db"),
            max_connections: 5,
            output_dir: PathBuf::from("."),
            tax_rate: None,
            company_name: None,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = CliConfig::default();
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let max_connections = match var("COTIZA_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("COTIZA_MAX_CONNECTIONS".to_string()))?,
            None => defaults.max_connections,
        };

        let tax_rate = match var("COTIZA_TAX_RATE") {
            Some(value) => {
                let rate = TaxRate::parse_percentage(&value)
                    .map_err(|_| ConfigError::InvalidValue("COTIZA_TAX_RATE".to_string()))?;
                validate_tax_rate(rate)
                    .map_err(|_| ConfigError::InvalidValue("COTIZA_TAX_RATE".to_string()))?;
                Some(rate)
            }
            None => None,
        };

        Ok(CliConfig {
            db_path: var("COTIZA_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            max_connections,
            output_dir: var("COTIZA_OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
            tax_rate,
            company_name: var("COTIZA_COMPANY_NAME").map(|name| name.trim().to_string()),
        })
    }

    /// Applies the process-level overrides to a settings snapshot.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(rate) = self.tax_rate {
            settings.default_tax = rate;
        }
        if let Some(name) = &self.company_name {
            settings.branding.company_name = name.clone();
        }
        settings
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(load(&[]).unwrap(), CliConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("COTIZA_DB_PATH", "/tmp/facturas.db"),
            ("COTIZA_MAX_CONNECTIONS", "2"),
            ("COTIZA_OUTPUT_DIR", "/tmp/out"),
            ("COTIZA_TAX_RATE", "8.25"),
            ("COTIZA_COMPANY_NAME", "  ACME S.A.  "),
        ])
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/facturas.db"));
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.tax_rate, Some(TaxRate::from_bps(825)));
        assert_eq!(config.company_name.as_deref(), Some("ACME S.A."));
    }

    #[test]
    fn test_invalid_values() {
        for (name, value) in [
            ("COTIZA_MAX_CONNECTIONS", "many"),
            ("COTIZA_MAX_CONNECTIONS", "0"),
            ("COTIZA_TAX_RATE", "dieciseis"),
            ("COTIZA_TAX_RATE", "250"),
        ] {
            match load(&[(name, value)]) {
                Err(ConfigError::InvalidValue(var)) => assert_eq!(var, name),
                other => panic!("{}={} should be rejected, got {:?}", name, value, other),
            }
        }
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = load(&[("COTIZA_TAX_RATE", " "), ("COTIZA_DB_PATH", "")]).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_apply_overrides_snapshot() {
        let config = load(&[("COTIZA_TAX_RATE", "0"), ("COTIZA_COMPANY_NAME", "ACME")]).unwrap();

        let settings = config.apply(Settings::default());
        assert_eq!(settings.default_tax, TaxRate::zero());
        assert_eq!(settings.branding.company_name, "ACME");

        let untouched = CliConfig::default().apply(Settings::default());
        assert_eq!(untouched, Settings::default());
    }
}
