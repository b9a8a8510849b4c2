//! Command execution results.

use serde::Serialize;
use std::fmt;

use crate::storage::Row;

/// Result of executing one command
///
/// Serializes untagged: SELECT results are a plain array of row objects,
/// every other kind is an object naming the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// SELECT result rows
    Rows(Vec<Row>),
    /// CREATE TABLE result
    Created { table: String },
    /// INSERT result
    Inserted { table: String, rows_affected: usize },
    /// UPDATE result
    Updated { table: String, rows_affected: usize },
    /// DELETE result
    Deleted { table: String, rows_affected: usize },
    /// DROP TABLE result; `existed` is false when there was nothing to drop
    Dropped { table: String, existed: bool },
}

impl QueryResult {
    /// Returns the number of rows affected, if applicable.
    pub fn rows_affected(&self) -> Option<usize> {
        match self {
            QueryResult::Inserted { rows_affected, .. }
            | QueryResult::Updated { rows_affected, .. }
            | QueryResult::Deleted { rows_affected, .. } => Some(*rows_affected),
            _ => None,
        }
    }

    /// Returns the rows if this is a SELECT result.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(rows) => write!(f, "{} row(s) returned", rows.len()),
            QueryResult::Created { table } => {
                write!(f, "Table '{}' created successfully.", table)
            }
            QueryResult::Inserted {
                table,
                rows_affected,
            } => write!(f, "{} row(s) inserted into '{}'.", rows_affected, table),
            QueryResult::Updated {
                table,
                rows_affected,
            } => write!(f, "{} row(s) updated in '{}'.", rows_affected, table),
            QueryResult::Deleted {
                table,
                rows_affected,
            } => write!(f, "{} row(s) deleted from '{}'.", rows_affected, table),
            QueryResult::Dropped {
                table,
                existed: true,
            } => write!(f, "Table '{}' dropped successfully.", table),
            QueryResult::Dropped {
                table,
                existed: false,
            } => write!(f, "Table '{}' does not exist, nothing dropped.", table),
        }
    }
}
