//! Whole-table reads and write-truncate loads
//!
//! Every published table is replaced wholesale inside one transaction: either
//! the new content is fully visible or the prior content is untouched.
//! All columns are stored as nullable TEXT.

use crate::{Error, Result, Table};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::debug;

/// Replace the content of `name` with `table` (write-truncate)
pub async fn write_table(pool: &SqlitePool, name: &str, table: &Table) -> Result<()> {
    validate_table_name(name)?;
    if table.columns().is_empty() {
        return Err(Error::InvalidInput(format!(
            "table '{}' has no columns",
            name
        )));
    }
    let mut seen = HashSet::new();
    for column in table.columns() {
        if !seen.insert(column.as_str()) {
            return Err(Error::InvalidInput(format!(
                "table '{}' has duplicate column '{}'",
                name, column
            )));
        }
    }

    let column_list = table
        .columns()
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let column_defs = table
        .columns()
        .iter()
        .map(|c| format!("{} TEXT", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; table.columns().len()].join(", ");
    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(name),
        column_list,
        placeholders
    );

    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("CREATE TABLE {} ({})", quote_ident(name), column_defs))
        .execute(&mut *tx)
        .await?;

    for row in table.rows() {
        let mut query = sqlx::query(&insert_sql);
        for value in row {
            query = query.bind(value.clone());
        }
        query.execute(&mut *tx).await?;
    }

    tx.commit().await?;

    debug!(table = name, rows = table.len(), "Table written");
    Ok(())
}

/// Whether a table exists in the warehouse
pub async fn table_exists(pool: &SqlitePool, name: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Read a whole table in insertion order
pub async fn read_table(pool: &SqlitePool, name: &str) -> Result<Table> {
    validate_table_name(name)?;
    if !table_exists(pool, name).await? {
        return Err(Error::NotFound(format!("table '{}'", name)));
    }

    let columns: Vec<String> = sqlx::query(&format!("PRAGMA table_info({})", quote_ident(name)))
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| row.try_get::<String, _>("name"))
        .collect::<std::result::Result<_, _>>()?;

    let mut table = Table::new(columns.clone());
    let rows = sqlx::query(&format!(
        "SELECT * FROM {} ORDER BY rowid",
        quote_ident(name)
    ))
    .fetch_all(pool)
    .await?;

    for row in rows {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(row.try_get::<Option<String>, _>(idx)?);
        }
        table.push_row(values);
    }
    Ok(table)
}

/// User tables in alphabetical order
pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<String>> {
    let tables = sqlx::query_scalar::<_, String>(
        r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table'
          AND name NOT LIKE 'sqlite_%'
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(tables)
}

fn validate_table_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid table name '{}'", name)))
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
