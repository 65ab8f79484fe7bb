//! # Sample Catalog Loader
//!
//! Adds the demo catalog to a Cotiza database.
//!
//! ```bash
//! cargo run -p cotiza-db --bin seed
//! cargo run -p cotiza-db --bin seed -- --db ./data/cotiza.db --stock 25
//! ```
//!
//! The database path defaults to `COTIZA_DB_PATH`, then `./cotiza.db`.
//! Codes already in the catalog are skipped, so running it twice is safe
//! and never resets stock or prices.

use std::env;
use std::path::PathBuf;

use clap::Parser;

use cotiza_core::{Money, ProductInput, Quantity};
use cotiza_db::{Database, DbConfig};

/// (code, name, price, description)
const CATALOG: &[(&str, &str, &str, &str)] = &[
    ("001", "Laptop Dell", "850.00", "Laptop Dell Inspiron 15"),
    ("002", "Mouse Logitech", "25.50", "Mouse inalámbrico"),
    ("003", "Teclado Mecánico", "75.00", "Teclado mecánico RGB"),
    ("004", "Monitor 24 pulgadas", "200.00", "Monitor Full HD"),
    ("005", "Cable HDMI", "12.00", "Cable HDMI 2.0"),
];

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Load the Cotiza demo catalog")]
struct Options {
    /// Database file (default: $COTIZA_DB_PATH or ./cotiza.db)
    #[arg(short, long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Opening stock for each new product
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(0..))]
    stock: i64,
}

impl Options {
    fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(|| {
            env::var("COTIZA_DB_PATH")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./cotiza.db"))
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::parse();
    let db_path = options.db_path();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("Seeding {}", db_path.display());

    let products = db.products();
    let mut added = 0;
    for (code, name, price, description) in CATALOG {
        if products.get_by_code(code).await?.is_some() {
            println!("  {}  already in catalog, skipped", code);
            continue;
        }

        let product = ProductInput::new(*code, *name, Money::parse(price)?, Quantity::from_units(options.stock))
            .with_description(*description)
            .into_product()?;
        products.upsert(&product).await?;
        added += 1;
        println!("  {}  {:<22} {:>10}  stock {}", product.code, product.name, product.unit_price, product.stock);
    }

    println!("Added {} of {} products ({} in catalog)", added, CATALOG.len(), products.count().await?);
    db.close().await;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options() {
        let options = Options::try_parse_from(["seed", "--db", "/tmp/demo.db", "-s", "25"]).unwrap();
        assert_eq!(options.db_path(), PathBuf::from("/tmp/demo.db"));
        assert_eq!(options.stock, 25);

        assert_eq!(Options::try_parse_from(["seed"]).unwrap().stock, 10);
        assert!(Options::try_parse_from(["seed", "--stock", "-1"]).is_err());
        assert!(Options::try_parse_from(["seed", "--stock", "diez"]).is_err());
    }
}
