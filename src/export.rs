//! Getting data out of the browser: CSV dumps and JSON row copies.

use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::{
    errors::DbError,
    models::query::{CellValue, QueryResult},
    session::Session,
    sql::quote_ident,
};

/// Writes `result` as delimited text with a header row. NULL is written as
/// `NULL`, blobs as hex.
pub fn write_delimited<W: Write>(
    result: &QueryResult,
    writer: W,
    delimiter: u8,
) -> Result<(), DbError> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(writer);

    if !result.columns.is_empty() {
        wtr.write_record(&result.columns)?;
    }
    for row in &result.values {
        wtr.write_record(row.iter().map(CellValue::to_string))?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_csv<W: Write>(result: &QueryResult, writer: W) -> Result<(), DbError> {
    write_delimited(result, writer, b',')
}

/// Dumps every row of `table` to a CSV file.
pub async fn export_table_csv(
    session: &Session,
    table: &str,
    path: impl AsRef<Path>,
) -> Result<(), DbError> {
    let result = session
        .execute(&format!("SELECT * FROM {}", quote_ident(table)))
        .await?;

    let file = std::fs::File::create(path.as_ref()).map_err(|e| DbError::Export(e.to_string()))?;
    write_csv(&result, file)?;

    log::info!(
        "exported {} rows of {} to {}",
        result.values.len(),
        table,
        path.as_ref().display()
    );
    Ok(())
}

/// A row as a JSON object keyed by column name.
pub fn row_to_json(columns: &[String], row: &[CellValue]) -> serde_json::Value {
    let map = columns
        .iter()
        .zip(row)
        .map(|(column, value)| (column.clone(), value.to_json()))
        .collect();
    serde_json::Value::Object(map)
}
