//! Catalog scan producing [`TableInfo`] for every user table.
//!
//! Nothing here is cached; callers re-run the scan after schema changes.

use crate::{
    errors::DbError,
    models::{
        query::{CellValue, QueryResult},
        schema::{ColumnInfo, ForeignKey, TableInfo},
    },
    session::Session,
    sql::quote_ident,
};

const LIST_TABLES: &str = "SELECT name, sql FROM sqlite_master \
     WHERE type='table' AND name NOT LIKE 'sqlite_%' \
     ORDER BY name ASC";

/// Every user table, ascending by name. Per-table lookups degrade
/// independently: a failed count is 0, failed metadata is an empty list.
pub async fn list_tables(session: &Session) -> Result<Vec<TableInfo>, DbError> {
    let catalog = session.execute(LIST_TABLES).await?;

    let mut tables = Vec::with_capacity(catalog.values.len());
    for row in &catalog.values {
        let name = text(row.first());
        let schema = text(row.get(1));

        let row_count = count_rows(session, &name).await;
        let columns = match table_columns(session, &name).await {
            Ok(columns) => columns,
            Err(e) => {
                log::warn!("could not fetch columns for {}: {}", name, e);
                Vec::new()
            }
        };
        let foreign_keys = match foreign_keys(session, &name).await {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("could not fetch foreign keys for {}: {}", name, e);
                Vec::new()
            }
        };

        tables.push(TableInfo {
            name,
            schema,
            row_count,
            columns,
            foreign_keys,
        });
    }

    Ok(tables)
}

/// Column metadata in declaration order; empty if the table is missing or
/// the lookup fails.
pub async fn get_columns(session: &Session, table: &str) -> Vec<ColumnInfo> {
    table_columns(session, table).await.unwrap_or_default()
}

/// All table DDL joined into one script.
pub async fn schema_script(session: &Session) -> Result<String, DbError> {
    if !session.is_loaded() {
        return Ok(String::new());
    }
    let tables = list_tables(session).await?;
    Ok(tables
        .iter()
        .map(|t| t.schema.as_str())
        .collect::<Vec<_>>()
        .join(";\n"))
}

async fn count_rows(session: &Session, table: &str) -> u64 {
    let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    match session.execute(&query).await {
        Ok(result) => first_count(&result),
        Err(e) => {
            log::warn!("could not count rows for {}: {}", table, e);
            0
        }
    }
}

// PRAGMA table_info: cid, name, type, notnull, dflt_value, pk
async fn table_columns(session: &Session, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
    let query = format!("PRAGMA table_info({})", quote_ident(table));
    let result = session.execute(&query).await?;

    Ok(result
        .values
        .iter()
        .map(|row| ColumnInfo {
            name: text(row.get(1)),
            data_type: text(row.get(2)),
            primary_key: row.get(5).and_then(CellValue::as_i64).unwrap_or(0) > 0,
        })
        .collect())
}

// PRAGMA foreign_key_list: id, seq, table, from, to, on_update, on_delete, match
async fn foreign_keys(session: &Session, table: &str) -> Result<Vec<ForeignKey>, DbError> {
    let query = format!("PRAGMA foreign_key_list({})", quote_ident(table));
    let result = session.execute(&query).await?;

    Ok(result
        .values
        .iter()
        .map(|row| ForeignKey {
            from: text(row.get(3)),
            to_table: text(row.get(2)),
            to_column: text(row.get(4)),
        })
        .collect())
}

/// Reads a count from the first cell; anything unreadable counts as 0.
pub(crate) fn first_count(result: &QueryResult) -> u64 {
    result
        .scalar()
        .and_then(CellValue::as_i64)
        .map(|n| n.max(0) as u64)
        .unwrap_or(0)
}

fn text(cell: Option<&CellValue>) -> String {
    match cell {
        None | Some(CellValue::Null) => String::new(),
        Some(value) => value.to_string(),
    }
}
