use thiserror::Error;

/// Error type for every operation of the data access layer.
#[derive(Error, Debug)]
pub enum DbError {
    /// Operation attempted before a database image was loaded.
    #[error("Database not loaded")]
    NotReady,
    /// The bytes handed to `load` are not a valid database image.
    #[error("Failed to load database: {0}")]
    Load(String),
    /// The engine rejected a statement. Carries the engine's message verbatim.
    #[error("{0}")]
    Query(String),
    /// A translated cell edit was rejected or could not be built.
    #[error("{0}")]
    Edit(String),
    #[error("Export error: {0}")]
    Export(String),
    /// Configuration error (e.g., unparsable environment value).
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Maps a sqlx failure to a query error holding the message SQLite reported.
    pub fn query(err: sqlx::Error) -> Self {
        DbError::Query(engine_message(&err))
    }
}

impl From<csv::Error> for DbError {
    fn from(err: csv::Error) -> Self {
        DbError::Csv(err.to_string())
    }
}

/// The engine's own message, without sqlx's wrapping text.
pub fn engine_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}
