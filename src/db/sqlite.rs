use std::io::Write;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow},
    Column, Executor, Row, SqlitePool, Statement, TypeInfo, ValueRef,
};
use tempfile::NamedTempFile;

use crate::{
    config::EngineConfig,
    errors::{engine_message, DbError},
    models::query::{CellValue, QueryResult},
    sql,
};

use super::DbClient;

/// SQLite engine working on a private copy of a database image.
pub struct SqliteClient {
    pub pool: SqlitePool,
    // Keeps the backing file alive for as long as the pool uses it.
    _image: NamedTempFile,
}

impl SqliteClient {
    pub async fn open(image: &[u8], config: &EngineConfig) -> Result<Self, DbError> {
        let mut file = NamedTempFile::new().map_err(|e| DbError::Load(e.to_string()))?;
        file.write_all(image)
            .and_then(|_| file.flush())
            .map_err(|e| DbError::Load(e.to_string()))?;

        let options = SqliteConnectOptions::new()
            .filename(file.path())
            .create_if_missing(false)
            .journal_mode(SqliteJournalMode::Delete)
            .foreign_keys(config.foreign_keys);

        // One connection: statements run strictly one at a time.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Load(engine_message(&e)))?;

        // SQLite opens lazily, so touch the catalog to reject bad images here.
        if let Err(e) = sqlx::query("SELECT COUNT(*) FROM sqlite_master")
            .fetch_one(&pool)
            .await
        {
            pool.close().await;
            return Err(DbError::Load(engine_message(&e)));
        }

        log::debug!("opened database image ({} bytes)", image.len());

        Ok(Self {
            pool,
            _image: file,
        })
    }

    async fn statement_columns(&self, query: &str) -> Vec<String> {
        match (&self.pool).prepare(query).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl DbClient for SqliteClient {
    async fn query(&self, query: &str) -> Result<QueryResult, DbError> {
        log::debug!("executing: {}", query);

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::query)?;

        let columns = match rows.first() {
            Some(row) => row
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            None => self.statement_columns(query).await,
        };

        let values = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResult {
            columns,
            values,
            execution_time: None,
        })
    }

    async fn export(&self) -> Result<Vec<u8>, DbError> {
        let dir = tempfile::tempdir().map_err(|e| DbError::Export(e.to_string()))?;
        let target = dir.path().join("export.sqlite");
        let vacuum = format!(
            "VACUUM INTO {}",
            sql::quote_text(&target.to_string_lossy())
        );

        sqlx::query(&vacuum)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::Export(engine_message(&e)))?;

        let bytes = tokio::fs::read(&target)
            .await
            .map_err(|e| DbError::Export(e.to_string()))?;
        Ok(bytes)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_row(row: &SqliteRow) -> Result<Vec<CellValue>, DbError> {
    (0..row.len()).map(|i| decode_cell(row, i)).collect()
}

/// Decodes by the value's runtime storage class, not the declared column type.
fn decode_cell(row: &SqliteRow, index: usize) -> Result<CellValue, DbError> {
    let raw = row.try_get_raw(index).map_err(DbError::query)?;
    if raw.is_null() {
        return Ok(CellValue::Null);
    }
    let storage = raw.type_info().name().to_string();

    let value = match storage.as_str() {
        "INTEGER" | "BOOLEAN" => CellValue::Integer(row.try_get(index).map_err(DbError::query)?),
        "REAL" | "NUMERIC" => CellValue::Real(row.try_get(index).map_err(DbError::query)?),
        "BLOB" => CellValue::Blob(row.try_get(index).map_err(DbError::query)?),
        _ => decode_text(row, index)?,
    };
    Ok(value)
}

/// SQLite does not enforce UTF-8 on TEXT; invalid sequences are replaced
/// rather than failing the whole result.
fn decode_text(row: &SqliteRow, index: usize) -> Result<CellValue, DbError> {
    let bytes: Vec<u8> = row.try_get_unchecked(index).map_err(DbError::query)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    Ok(CellValue::Text(text))
}
