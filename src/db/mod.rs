use crate::{errors::DbError, models::query::QueryResult};
use async_trait::async_trait;

pub mod sqlite;

/// The embedded engine as seen by the session: SQL text in, rows out.
#[async_trait]
pub trait DbClient {
    async fn query(&self, sql: &str) -> Result<QueryResult, DbError>;
    /// Serializes the whole database to its native on-disk format.
    async fn export(&self) -> Result<Vec<u8>, DbError>;
    async fn close(&self);
}
