use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::DbError;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Options applied when the engine opens an image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Enforce foreign key constraints on edits. SQLite leaves this off
    /// unless asked.
    pub foreign_keys: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub page_size: u32,
    pub search_debounce_ms: u64,
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Reads `DLENS_*` variables, picking up a `.env` file if present.
    pub fn from_env() -> Result<Self, DbError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(raw) = lookup("DLENS_PAGE_SIZE") {
            let page_size: u32 = parse(&raw, "DLENS_PAGE_SIZE")?;
            if page_size == 0 {
                return Err(DbError::Config(
                    "DLENS_PAGE_SIZE must be greater than zero".to_string(),
                ));
            }
            config.page_size = page_size;
        }
        if let Some(raw) = lookup("DLENS_SEARCH_DEBOUNCE_MS") {
            config.search_debounce_ms = parse(&raw, "DLENS_SEARCH_DEBOUNCE_MS")?;
        }
        if let Some(raw) = lookup("DLENS_FOREIGN_KEYS") {
            config.engine.foreign_keys = parse_flag(&raw, "DLENS_FOREIGN_KEYS")?;
        }

        Ok(config)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

fn parse<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T, DbError> {
    raw.trim()
        .parse()
        .map_err(|_| DbError::Config(format!("invalid value for {}: {:?}", key, raw)))
}

fn parse_flag(raw: &str, key: &str) -> Result<bool, DbError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DbError::Config(format!(
            "invalid value for {}: {:?}",
            key, raw
        ))),
    }
}
