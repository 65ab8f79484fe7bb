//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD keyed by product code
//! - Case-insensitive substring search over code and name
//! - Conditional stock updates
//!
//! ## Conditional Stock Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products                                                       │
//! │     SET stock_milli = stock_milli + Δ                                  │
//! │   WHERE code = ? AND stock_milli + Δ >= 0                              │
//! │  RETURNING stock_milli                                                 │
//! │       │                                                                 │
//! │       ├── row returned   → Applied(new level)                          │
//! │       └── no row         → look the product up:                        │
//! │              ├── missing → NotFound                                    │
//! │              └── present → Insufficient { available }                  │
//! │                                                                         │
//! │  The check and the write are one statement, so two sellers can never  │
//! │  both take the last unit.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use cotiza_core::store::StockAdjustment;
use cotiza_core::{Money, Product, Quantity};

#[derive(Debug, FromRow)]
struct ProductRow {
    code: String,
    name: String,
    unit_price_cents: i64,
    description: Option<String>,
    unit: String,
    stock_milli: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            code: row.code,
            name: row.name,
            unit_price: Money::from_cents(row.unit_price_cents),
            description: row.description,
            unit: row.unit,
            stock: Quantity::from_milli(row.stock_milli),
        }
    }
}

const PRODUCT_COLUMNS: &str = "code, name, unit_price_cents, description, unit, stock_milli";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let laptop = repo.get_by_code("001").await?;
/// let hits = repo.search("dell").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE code = ?1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a product or replaces every field of the existing one.
    ///
    /// `created_at` survives the replace.
    pub async fn upsert(&self, product: &Product) -> DbResult<()> {
        let now = Utc::now();

        debug!(code = %product.code, name = %product.name, "Upserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                code, name, unit_price_cents, description, unit, stock_milli,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT (code) DO UPDATE SET
                name = excluded.name,
                unit_price_cents = excluded.unit_price_cents,
                description = excluded.description,
                unit = excluded.unit,
                stock_milli = excluded.stock_milli,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.unit_price.cents())
        .bind(&product.description)
        .bind(&product.unit)
        .bind(product.stock.milli())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Applies `delta` to the stock level unless it would go negative.
    pub async fn adjust_stock(&self, code: &str, delta: Quantity) -> DbResult<StockAdjustment> {
        let mut conn = self.pool.acquire().await?;
        adjust_stock_in(&mut conn, code, delta).await
    }

    /// Deletes a product. Returns false when nothing matched.
    ///
    /// Documents keep their own snapshot of the product, so nothing else
    /// is touched.
    pub async fn delete(&self, code: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists every product ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {} FROM products ORDER BY name, code", PRODUCT_COLUMNS);
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Products whose code or name contains `term`, ignoring ASCII case.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Product>> {
        debug!(term = %term, "Searching products");

        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE instr(lower(name), lower(?1)) > 0
               OR instr(lower(code), lower(?1)) > 0
            ORDER BY name, code
            "#,
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(term)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Number of catalog entries.
    pub async fn count(&self) -> DbResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }
}

/// Conditional stock update on an existing connection or transaction.
pub(crate) async fn adjust_stock_in(
    conn: &mut SqliteConnection,
    code: &str,
    delta: Quantity,
) -> DbResult<StockAdjustment> {
    let updated: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock_milli = stock_milli + ?2, updated_at = ?3
        WHERE code = ?1 AND stock_milli + ?2 >= 0
        RETURNING stock_milli
        "#,
    )
    .bind(code)
    .bind(delta.milli())
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(level) = updated {
        debug!(code = %code, delta = %delta, stock = level, "Stock adjusted");
        return Ok(StockAdjustment::Applied(Quantity::from_milli(level)));
    }

    let current: Option<i64> = sqlx::query_scalar("SELECT stock_milli FROM products WHERE code = ?1")
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(match current {
        None => StockAdjustment::NotFound,
        Some(level) => StockAdjustment::Insufficient {
            available: Quantity::from_milli(level),
        },
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use cotiza_core::store::StockAdjustment;
    use cotiza_core::{Money, Product, Quantity};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(code: &str, name: &str, stock: i64) -> Product {
        Product::new(code, name, Money::from_cents(1000), Quantity::from_units(stock))
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = db().await;
        let repo = db.products();

        let mut laptop = product("001", "Laptop Dell", 10);
        laptop.description = Some("Core i5".to_string());
        repo.upsert(&laptop).await.unwrap();
        assert_eq!(repo.get_by_code("001").await.unwrap(), Some(laptop.clone()));

        laptop.unit_price = Money::from_cents(90000);
        laptop.description = None;
        repo.upsert(&laptop).await.unwrap();
        assert_eq!(repo.get_by_code("001").await.unwrap(), Some(laptop));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_adjust_stock_outcomes() {
        let db = db().await;
        let repo = db.products();
        repo.upsert(&product("001", "Laptop Dell", 10)).await.unwrap();

        let outcome = repo.adjust_stock("001", Quantity::from_units(-11)).await.unwrap();
        assert_eq!(
            outcome,
            StockAdjustment::Insufficient {
                available: Quantity::from_units(10)
            }
        );

        let outcome = repo.adjust_stock("001", Quantity::from_units(-10)).await.unwrap();
        assert_eq!(outcome, StockAdjustment::Applied(Quantity::zero()));

        let outcome = repo.adjust_stock("001", Quantity::parse("2.5").unwrap()).await.unwrap();
        assert_eq!(outcome, StockAdjustment::Applied(Quantity::from_milli(2500)));

        let outcome = repo.adjust_stock("999", Quantity::from_units(1)).await.unwrap();
        assert_eq!(outcome, StockAdjustment::NotFound);
    }

    #[tokio::test]
    async fn test_list_orders_by_name_and_search() {
        let db = db().await;
        let repo = db.products();
        repo.upsert(&product("003", "Teclado Mecánico", 5)).await.unwrap();
        repo.upsert(&product("001", "Laptop Dell", 10)).await.unwrap();
        repo.upsert(&product("002", "Mouse Inalámbrico", 25)).await.unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Laptop Dell", "Mouse Inalámbrico", "Teclado Mecánico"]);

        let hits = repo.search("DELL").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "001");

        let hits = repo.search("00").await.unwrap();
        assert_eq!(hits.len(), 3);

        assert!(repo.search("monitor").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = db().await;
        let repo = db.products();
        repo.upsert(&product("001", "Laptop Dell", 10)).await.unwrap();

        assert!(repo.delete("001").await.unwrap());
        assert!(!repo.delete("001").await.unwrap());
        assert_eq!(repo.get_by_code("001").await.unwrap(), None);
    }
}
