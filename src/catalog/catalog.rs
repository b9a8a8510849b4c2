//! System Catalog for TableDB
//!
//! This module manages the registry of table schemas. The registry is held
//! fully in memory and written through to a single document on every change.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info};

use super::schema::{SchemaEntry, TableSchema};
use crate::error::{Error, Result};
use crate::storage::disk;
use crate::storage::Value;

/// System Catalog - manages all table schemas
#[derive(Debug)]
pub struct Catalog {
    /// Registry document path
    path: PathBuf,
    /// Table schemas by name, in creation order
    tables: IndexMap<String, TableSchema>,
}

impl Catalog {
    /// Open the catalog backed by the registry document at `path`
    ///
    /// A missing or empty document yields an empty catalog.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries: IndexMap<String, SchemaEntry> =
            disk::read_document(&path)?.unwrap_or_default();

        let mut tables = IndexMap::with_capacity(entries.len());
        for (name, entry) in entries {
            let schema = TableSchema::from_entry(&name, entry)?;
            tables.insert(schema.name().to_string(), schema);
        }

        info!(path = %path.display(), tables = tables.len(), "catalog loaded");
        Ok(Self { path, tables })
    }

    /// Register a new table
    ///
    /// The registry document is written before the in-memory map changes, so
    /// a failed write leaves the catalog as it was.
    pub fn create_table(&mut self, schema: TableSchema) -> Result<()> {
        if self.table_exists(schema.name()) {
            return Err(Error::TableAlreadyExists(schema.name().to_string()));
        }

        debug!(table = schema.name(), "registering table");
        let mut staged = self.tables.clone();
        staged.insert(schema.name().to_string(), schema);
        write_registry(&self.path, &staged)?;
        self.tables = staged;
        Ok(())
    }

    /// Drop a table; only removes (and persists) if present
    ///
    /// Returns whether the table existed.
    pub fn drop_table(&mut self, name: &str) -> Result<bool> {
        if !self.table_exists(name) {
            return Ok(false);
        }

        debug!(table = name, "unregistering table");
        let mut staged = self.tables.clone();
        staged.shift_remove(name);
        write_registry(&self.path, &staged)?;
        self.tables = staged;
        Ok(true)
    }

    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Result<&TableSchema> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// List all table names, in creation order
    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Check that `value` may be stored in `table.column`
    ///
    /// The value's kind must match the declared type exactly.
    pub fn validate_value(&self, table: &str, column: &str, value: &Value) -> Result<()> {
        let schema = self.get_table(table)?;
        let expected = schema
            .column_type(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string(), table.to_string()))?;

        let found = value.data_type();
        if found != expected {
            return Err(Error::TypeMismatch {
                column: column.to_string(),
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Get table schema info as a formatted string (for .schema command)
    pub fn describe_table(&self, name: &str) -> Result<String> {
        let schema = self.get_table(name)?;
        let mut info = format!("Table: {}\n", schema.name());
        info.push_str("Columns:\n");

        for (column, data_type) in schema.columns() {
            let mut flags = Vec::new();
            if column == schema.primary_key() {
                flags.push("PRIMARY KEY");
            }
            if schema.is_unique(column) {
                flags.push("UNIQUE");
            }

            let flags_str = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };

            info.push_str(&format!("  {} {}{}\n", column, data_type, flags_str));
        }

        Ok(info)
    }

}

/// Rewrite the registry document from `tables`
fn write_registry(path: &Path, tables: &IndexMap<String, TableSchema>) -> Result<()> {
    let data: IndexMap<&str, SchemaEntry> = tables
        .iter()
        .map(|(name, schema)| (name.as_str(), schema.to_entry()))
        .collect();
    disk::write_document(path, &data)
}
