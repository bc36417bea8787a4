use serde::{Deserialize, Serialize};

use crate::{
    errors::DbError,
    models::{query::CellValue, schema::TableInfo},
};

use super::{literal, match_predicate, quote_ident};

/// A single-cell edit as issued from a table view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellEdit {
    pub table: String,
    pub column: String,
    pub new_value: CellValue,
    /// The row as currently displayed, before the edit.
    pub row: Vec<CellValue>,
    /// Column names in the order of `row`.
    pub row_columns: Vec<String>,
}

/// Builds the `UPDATE` for one cell edit.
///
/// The row is identified by its primary key columns when the table has any,
/// otherwise by every displayed column. Without a key, duplicate rows are all
/// updated.
pub fn build_update(
    table: &TableInfo,
    column: &str,
    new_value: &CellValue,
    current_row: &[CellValue],
    row_columns: &[String],
) -> Result<String, DbError> {
    if current_row.len() != row_columns.len() {
        return Err(DbError::Edit(format!(
            "row has {} values but {} columns",
            current_row.len(),
            row_columns.len()
        )));
    }

    let key_columns: Vec<&str> = table.primary_key().map(|c| c.name.as_str()).collect();
    let predicates = if key_columns.is_empty() {
        row_columns
            .iter()
            .zip(current_row)
            .map(|(name, value)| match_predicate(name, value))
            .collect::<Vec<_>>()
    } else {
        key_columns
            .iter()
            .map(|name| {
                old_value(name, current_row, row_columns).map(|value| match_predicate(name, value))
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    // An empty WHERE would rewrite the whole table.
    if predicates.is_empty() {
        return Err(DbError::Edit(format!(
            "cannot identify the row to update in {}",
            table.name
        )));
    }

    Ok(format!(
        "UPDATE {} SET {} = {} WHERE {};",
        quote_ident(&table.name),
        quote_ident(column),
        literal(new_value),
        predicates.join(" AND ")
    ))
}

fn old_value<'r>(
    name: &str,
    current_row: &'r [CellValue],
    row_columns: &[String],
) -> Result<&'r CellValue, DbError> {
    row_columns
        .iter()
        .position(|c| c == name)
        .map(|i| &current_row[i])
        .ok_or_else(|| DbError::Edit(format!("column {} is not part of the row", name)))
}
