//! Schema definitions for TableDB
//!
//! This module defines table schemas and their validation rules.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::DataType;
use crate::error::{Error, Result};

/// Whether a name is usable as a table or column identifier
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Table schema - column types, primary key and uniqueness constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    columns: IndexMap<String, DataType>,
    primary_key: String,
    unique_columns: Vec<String>,
}

impl TableSchema {
    /// Build and validate a schema
    ///
    /// `columns` pairs column names with type names as written in the
    /// statement. The primary key is always added to the unique columns.
    pub fn new(
        name: &str,
        columns: &[(String, String)],
        primary_key: &str,
        unique_columns: &[String],
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Schema("table name cannot be empty".to_string()));
        }
        if !is_identifier(name) {
            return Err(Error::Schema(format!("invalid table name '{}'", name)));
        }

        if columns.is_empty() {
            return Err(Error::Schema(
                "table must have at least one column".to_string(),
            ));
        }

        let mut column_types = IndexMap::with_capacity(columns.len());
        for (column, type_name) in columns {
            let column = column.trim();
            if !is_identifier(column) {
                return Err(Error::Schema(format!("invalid column name '{}'", column)));
            }
            let data_type: DataType = type_name.parse().map_err(|_| {
                Error::Schema(format!(
                    "unsupported data type '{}' for column '{}'",
                    type_name.trim(),
                    column
                ))
            })?;
            if column_types.insert(column.to_string(), data_type).is_some() {
                return Err(Error::Schema(format!(
                    "duplicate column name '{}'",
                    column
                )));
            }
        }

        let primary_key = primary_key.trim();
        if !column_types.contains_key(primary_key) {
            return Err(Error::Schema(format!(
                "primary key '{}' must be a column in the table",
                primary_key
            )));
        }

        let mut unique = Vec::with_capacity(unique_columns.len() + 1);
        for column in unique_columns {
            let column = column.trim();
            if !column_types.contains_key(column) {
                return Err(Error::Schema(format!(
                    "unique column '{}' must be a column in the table",
                    column
                )));
            }
            if !unique.iter().any(|c| c == column) {
                unique.push(column.to_string());
            }
        }
        if !unique.iter().any(|c| c == primary_key) {
            unique.push(primary_key.to_string());
        }

        Ok(Self {
            name: name.to_string(),
            columns: column_types,
            primary_key: primary_key.to_string(),
            unique_columns: unique,
        })
    }

    /// Get the table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &IndexMap<String, DataType> {
        &self.columns
    }

    /// Get number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Get the declared type of a column
    pub fn column_type(&self, column: &str) -> Option<DataType> {
        self.columns.get(column).copied()
    }

    /// Check if column exists
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Unique-constrained columns; always contains the primary key
    pub fn unique_columns(&self) -> &[String] {
        &self.unique_columns
    }

    pub fn is_unique(&self, column: &str) -> bool {
        self.unique_columns.iter().any(|c| c == column)
    }

    /// Convert to the registry document form
    pub(crate) fn to_entry(&self) -> SchemaEntry {
        SchemaEntry {
            columns: self.columns.clone(),
            primary_key: self.primary_key.clone(),
            unique_columns: self.unique_columns.clone(),
        }
    }

    /// Rebuild (and re-validate) a schema from its registry document form
    pub(crate) fn from_entry(name: &str, entry: SchemaEntry) -> Result<Self> {
        let columns: Vec<(String, String)> = entry
            .columns
            .into_iter()
            .map(|(column, data_type)| (column, data_type.sql_name().to_string()))
            .collect();
        Self::new(name, &columns, &entry.primary_key, &entry.unique_columns)
    }
}

/// One table's entry in the registry document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SchemaEntry {
    columns: IndexMap<String, DataType>,
    primary_key: String,
    #[serde(default)]
    unique_columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(defs: &[(&str, &str)]) -> Vec<(String, String)> {
        defs.iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn test_schema_creation() {
        let schema = TableSchema::new(
            " users ",
            &cols(&[("id", "INT"), ("name", "TEXT"), ("active", "BOOL")]),
            "id",
            &["name".to_string()],
        )
        .unwrap();

        assert_eq!(schema.name(), "users");
        assert_eq!(schema.column_count(), 3);
        assert_eq!(
            schema.column_names().collect::<Vec<_>>(),
            vec!["id", "name", "active"]
        );
        assert_eq!(schema.column_type("active"), Some(DataType::Boolean));
        assert_eq!(schema.unique_columns(), ["name", "id"]);
        assert!(schema.is_unique("id"));
        assert!(!schema.is_unique("active"));
    }

    #[test]
    fn test_primary_key_implicitly_unique() {
        let schema = TableSchema::new("t", &cols(&[("id", "INTEGER")]), "id", &[]).unwrap();
        assert_eq!(schema.unique_columns(), ["id"]);
    }

    #[test]
    fn test_invalid_schemas() {
        assert!(matches!(
            TableSchema::new("  ", &cols(&[("id", "INT")]), "id", &[]),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            TableSchema::new("t", &[], "id", &[]),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            TableSchema::new("t", &cols(&[("id", "INT"), ("id", "TEXT")]), "id", &[]),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            TableSchema::new("t", &cols(&[("id", "FLOAT")]), "id", &[]),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            TableSchema::new("t", &cols(&[("id", "INT")]), "missing", &[]),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            TableSchema::new("t", &cols(&[("id", "INT")]), "id", &["x".to_string()]),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            TableSchema::new("../t", &cols(&[("id", "INT")]), "id", &[]),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_entry_round_trip() {
        let schema = TableSchema::new(
            "users",
            &cols(&[("id", "INT"), ("email", "TEXT")]),
            "id",
            &["email".to_string()],
        )
        .unwrap();

        let json = serde_json::to_string(&schema.to_entry()).unwrap();
        assert_eq!(
            json,
            r#"{"columns":{"id":"INTEGER","email":"TEXT"},"primary_key":"id","unique_columns":["email","id"]}"#
        );

        let entry: SchemaEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(TableSchema::from_entry("users", entry).unwrap(), schema);
    }
}
