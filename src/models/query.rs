use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single cell as produced by the engine or supplied by an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Blob(Vec<u8>),
}

impl CellValue {
    /// Reads a 0/1 integer as a boolean. SQLite has no boolean storage class,
    /// so this is only a display convention.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Integer(0) => Some(false),
            CellValue::Integer(1) => Some(true),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(n) => Some(*n),
            CellValue::Real(f) => Some(*f as i64),
            CellValue::Boolean(b) => Some(i64::from(*b)),
            CellValue::Text(s) => s.trim().parse().ok(),
            CellValue::Null | CellValue::Blob(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Integer(n) => serde_json::Value::from(*n),
            CellValue::Real(f) => serde_json::Value::from(*f),
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::Boolean(b) => serde_json::Value::Bool(*b),
            CellValue::Blob(bytes) => serde_json::Value::from(bytes.clone()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Integer(n) => write!(f, "{}", n),
            CellValue::Real(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Blob(bytes) => f.write_str(&hex(bytes)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Integer(n)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Real(v)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub values: Vec<Vec<CellValue>>,
    pub execution_time: Option<Duration>,
}

impl QueryResult {
    /// First cell of the first row, if any.
    pub fn scalar(&self) -> Option<&CellValue> {
        self.values.first().and_then(|row| row.first())
    }
}
