//! # Line Item Rows
//!
//! `invoice_lines` and `quotation_lines` share one shape: a frozen product
//! snapshot plus a quantity, ordered by `position`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ id (uuid) │ document_number │ position │ product_* │ quantity_milli │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These helpers take a bare `SqliteConnection` so they run the same way
//! on a pooled connection or inside a transaction.

use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::error::DbResult;
use cotiza_core::{LineItem, Money, ProductSnapshot, Quantity};

/// Which document table a set of lines belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineTable {
    Invoice,
    Quotation,
}

impl LineTable {
    fn name(self) -> &'static str {
        match self {
            LineTable::Invoice => "invoice_lines",
            LineTable::Quotation => "quotation_lines",
        }
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    product_code: String,
    product_name: String,
    unit_price_cents: i64,
    unit: String,
    quantity_milli: i64,
}

impl From<LineRow> for LineItem {
    fn from(row: LineRow) -> Self {
        LineItem {
            product: ProductSnapshot {
                code: row.product_code,
                name: row.product_name,
                unit_price: Money::from_cents(row.unit_price_cents),
                unit: row.unit,
            },
            quantity: Quantity::from_milli(row.quantity_milli),
        }
    }
}

/// Writes `items` for `number`, keeping their order.
pub(crate) async fn insert_lines(
    conn: &mut SqliteConnection,
    table: LineTable,
    number: &str,
    items: &[LineItem],
) -> DbResult<()> {
    let sql = format!(
        r#"
        INSERT INTO {} (
            id, document_number, position,
            product_code, product_name, unit_price_cents, unit,
            quantity_milli
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        table.name()
    );

    for (position, item) in items.iter().enumerate() {
        sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(number)
            .bind(position as i64)
            .bind(&item.product.code)
            .bind(&item.product.name)
            .bind(item.product.unit_price.cents())
            .bind(&item.product.unit)
            .bind(item.quantity.milli())
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Loads the lines of `number` in display order.
pub(crate) async fn load_lines(
    conn: &mut SqliteConnection,
    table: LineTable,
    number: &str,
) -> DbResult<Vec<LineItem>> {
    let sql = format!(
        r#"
        SELECT product_code, product_name, unit_price_cents, unit, quantity_milli
        FROM {}
        WHERE document_number = ?1
        ORDER BY position
        "#,
        table.name()
    );

    let rows = sqlx::query_as::<_, LineRow>(&sql)
        .bind(number)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(LineItem::from).collect())
}

/// Removes every line of `number`.
pub(crate) async fn delete_lines(conn: &mut SqliteConnection, table: LineTable, number: &str) -> DbResult<()> {
    let sql = format!("DELETE FROM {} WHERE document_number = ?1", table.name());
    sqlx::query(&sql).bind(number).execute(&mut *conn).await?;
    Ok(())
}
