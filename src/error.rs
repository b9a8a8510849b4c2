//! Error types for TableDB
//!
//! This module defines all error types used throughout the database engine.

use serde::Serialize;
use thiserror::Error;

use crate::catalog::DataType;

/// The main error type for TableDB
#[derive(Error, Debug)]
pub enum Error {
    // ========== Parser Errors ==========
    #[error("Parse error: {0}")]
    Parse(String),

    // ========== Schema Errors ==========
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Schema error: table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Schema error: invalid type for column '{column}', expected {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: DataType,
    },

    #[error("Schema error: unique constraint violation on column '{0}'")]
    UniqueViolation(String),

    #[error("Schema error: missing value for column '{0}'")]
    MissingValue(String),

    #[error("Schema error: expected {expected} values, got {found}")]
    ValueCountMismatch { expected: usize, found: usize },

    // ========== Catalog Errors ==========
    #[error("Catalog error: table '{0}' does not exist")]
    TableNotFound(String),

    #[error("Catalog error: column '{0}' does not exist in table '{1}'")]
    ColumnNotFound(String, String),

    // ========== Storage Errors ==========
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Which side of the engine boundary a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    /// The statement text did not match the grammar
    Parse,
    /// The statement parsed but could not be carried out
    Execution,
}

impl Error {
    /// Classify this error for the response envelope
    pub fn error_type(&self) -> ErrorType {
        match self {
            Error::Parse(_) => ErrorType::Parse,
            _ => ErrorType::Execution,
        }
    }
}

/// Result type alias for TableDB operations
pub type Result<T> = std::result::Result<T, Error>;
