use std::time::Instant;

use crate::{
    config::EngineConfig,
    db::{sqlite::SqliteClient, DbClient},
    errors::DbError,
    models::query::QueryResult,
};

/// Owns the single open database handle. Every other component reaches the
/// engine through a `&Session`.
#[derive(Default)]
pub struct Session {
    client: Option<Box<dyn DbClient + Send + Sync>>,
    config: EngineConfig,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Session {
            client: None,
            config,
        }
    }

    /// Wraps an already open engine handle.
    pub fn with_client(client: Box<dyn DbClient + Send + Sync>) -> Self {
        Session {
            client: Some(client),
            config: EngineConfig::default(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.client.is_some()
    }

    /// Closes the current handle, then opens `image`. On failure the session
    /// is left without a handle.
    pub async fn load(&mut self, image: &[u8]) -> Result<(), DbError> {
        self.close().await;

        let client = SqliteClient::open(image, &self.config).await?;
        self.client = Some(Box::new(client));

        log::info!("loaded database image ({} bytes)", image.len());
        Ok(())
    }

    pub async fn close(&mut self) {
        if let Some(client) = self.client.take() {
            client.close().await;
        }
    }

    pub async fn execute(&self, sql: &str) -> Result<QueryResult, DbError> {
        let client = self.client.as_ref().ok_or(DbError::NotReady)?;

        let start = Instant::now();
        let mut result = client.query(sql).await?;
        result.execution_time = Some(start.elapsed());

        Ok(result)
    }

    /// The current database as bytes, or `None` when nothing is loaded.
    pub async fn export(&self) -> Result<Option<Vec<u8>>, DbError> {
        match &self.client {
            Some(client) => Ok(Some(client.export().await?)),
            None => Ok(None),
        }
    }
}
