//! Data types for TableDB
//!
//! This module defines the column types supported by the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer
    #[serde(rename = "INTEGER", alias = "INT")]
    Integer,
    /// Unlimited text
    #[serde(rename = "TEXT")]
    Text,
    /// Boolean type
    #[serde(rename = "BOOLEAN", alias = "BOOL")]
    Boolean,
}

impl DataType {
    /// Canonical SQL name for this type
    pub fn sql_name(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Boolean => "BOOLEAN",
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    /// Accepts the canonical names and the `INT` / `BOOL` aliases, in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INTEGER" | "INT" => Ok(DataType::Integer),
            "TEXT" => Ok(DataType::Text),
            "BOOLEAN" | "BOOL" => Ok(DataType::Boolean),
            other => Err(Error::Schema(format!("unsupported data type '{}'", other))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_name())
    }
}
