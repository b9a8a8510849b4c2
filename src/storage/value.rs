//! Value and Row types for TableDB
//!
//! This module defines how data values are represented in memory and in
//! table documents.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::DataType;

/// A value in the database
///
/// Equality is strict per kind: `Integer(1)` never equals `Boolean(true)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value
    Boolean(bool),
    /// Integer value (64-bit)
    Integer(i64),
    /// Text value
    Text(String),
}

impl Value {
    /// The column type this value belongs to
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Integer(_) => DataType::Integer,
            Value::Text(_) => DataType::Text,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// A row: column name to value, in column declaration order
pub type Row = IndexMap<String, Value>;

/// Column equality filters, logically ANDed
pub type Filters = IndexMap<String, Value>;

/// Check whether a row satisfies every filter
pub fn row_matches(row: &Row, filters: &Filters) -> bool {
    filters
        .iter()
        .all(|(column, expected)| row.get(column) == Some(expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_kind_equality() {
        assert_ne!(Value::Integer(1), Value::Boolean(true));
        assert_ne!(Value::Integer(0), Value::Boolean(false));
        assert_ne!(Value::Text("1".to_string()), Value::Integer(1));
        assert_eq!(Value::Integer(1).data_type(), DataType::Integer);
        assert_eq!(Value::Boolean(true).data_type(), DataType::Boolean);
    }

    #[test]
    fn test_native_json_encoding() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::Integer(7));
        row.insert("name".to_string(), Value::from("Alice"));
        row.insert("active".to_string(), Value::Boolean(true));

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":7,"name":"Alice","active":true}"#);

        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
        assert_eq!(back.get("active"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_row_matches() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::Integer(1));
        row.insert("flag".to_string(), Value::Boolean(true));

        let mut filters = Filters::new();
        assert!(row_matches(&row, &filters));

        filters.insert("id".to_string(), Value::Integer(1));
        assert!(row_matches(&row, &filters));

        filters.insert("flag".to_string(), Value::Integer(1));
        assert!(!row_matches(&row, &filters));
    }
}
