//! Table storage for TableDB
//!
//! Each table's rows (its extent) are held in memory as an ordered vector
//! and backed by one JSON document. Every mutation rewrites the whole
//! document before returning.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info};

use super::disk;
use super::value::{row_matches, Filters, Row, Value};
use crate::catalog::{Catalog, TableSchema};
use crate::error::{Error, Result};

/// Row storage for all tables
#[derive(Debug)]
pub struct Storage {
    /// Directory holding one document per table
    tables_dir: PathBuf,
    /// Table extents by name
    extents: HashMap<String, Vec<Row>>,
}

impl Storage {
    /// Open storage and load the extent of every table in the catalog
    pub fn open(tables_dir: impl Into<PathBuf>, catalog: &Catalog) -> Result<Self> {
        let tables_dir = tables_dir.into();
        std::fs::create_dir_all(&tables_dir)?;

        let mut storage = Self {
            tables_dir,
            extents: HashMap::new(),
        };

        for table in catalog.list_tables() {
            let rows = storage.load_table(table)?;
            debug!(table, rows = rows.len(), "extent loaded");
            storage.extents.insert(table.to_string(), rows);
        }

        info!(tables = storage.extents.len(), "storage opened");
        Ok(storage)
    }

    /// Directory holding the table documents
    pub fn tables_dir(&self) -> &Path {
        &self.tables_dir
    }

    /// Whether an extent exists for this table
    pub fn has_table(&self, table: &str) -> bool {
        self.extents.contains_key(table)
    }

    /// Number of rows in a table, if it has an extent
    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.extents.get(table).map(Vec::len)
    }

    /// Allocate an empty extent for a new table
    pub fn create_table(&mut self, table: &str) -> Result<()> {
        if self.extents.contains_key(table) {
            return Err(Error::Storage(format!(
                "table '{}' already exists in storage",
                table
            )));
        }

        self.write_extent(table, &[])?;
        self.extents.insert(table.to_string(), Vec::new());
        Ok(())
    }

    /// Validate and append a row
    ///
    /// The stored row contains exactly the schema's columns, in declaration
    /// order.
    pub fn insert_row(&mut self, catalog: &Catalog, table: &str, row: Row) -> Result<()> {
        let schema = catalog.get_table(table)?;
        let rows = self
            .extents
            .get(table)
            .ok_or_else(|| missing_extent(table))?;

        let mut new_row = Row::with_capacity(schema.column_count());
        for column in schema.column_names() {
            let value = row
                .get(column)
                .ok_or_else(|| Error::MissingValue(column.to_string()))?;
            catalog.validate_value(table, column, value)?;
            new_row.insert(column.to_string(), value.clone());
        }

        for column in schema.unique_columns() {
            let value = &new_row[column.as_str()];
            if rows.iter().any(|existing| existing.get(column) == Some(value)) {
                return Err(Error::UniqueViolation(column.clone()));
            }
        }

        let mut staged = rows.clone();
        staged.push(new_row);
        self.write_extent(table, &staged)?;

        debug!(table, "row inserted");
        self.extents.insert(table.to_string(), staged);
        Ok(())
    }

    /// Return copies of all rows matching every filter, in storage order
    pub fn query_rows(&self, catalog: &Catalog, table: &str, filters: &Filters) -> Result<Vec<Row>> {
        let schema = catalog.get_table(table)?;
        check_filter_columns(schema, filters)?;

        let rows = self
            .extents
            .get(table)
            .ok_or_else(|| missing_extent(table))?;

        Ok(rows
            .iter()
            .filter(|row| row_matches(row, filters))
            .cloned()
            .collect())
    }

    /// Apply `updates` to every row matching `filters`
    ///
    /// Updates are staged on a copy of the extent: if any matched row fails
    /// validation or a uniqueness check the extent is left untouched. SET
    /// columns and values are only validated against matched rows. A row is
    /// never checked against its own current value.
    pub fn update_rows(
        &mut self,
        catalog: &Catalog,
        table: &str,
        updates: &IndexMap<String, Value>,
        filters: &Filters,
    ) -> Result<usize> {
        let schema = catalog.get_table(table)?;
        check_filter_columns(schema, filters)?;

        let rows = self
            .extents
            .get(table)
            .ok_or_else(|| missing_extent(table))?;

        let mut staged = rows.clone();
        let mut updated = 0;

        for index in 0..staged.len() {
            if !row_matches(&staged[index], filters) {
                continue;
            }

            for (column, value) in updates {
                if !schema.has_column(column) {
                    return Err(Error::ColumnNotFound(column.clone(), table.to_string()));
                }
                catalog.validate_value(table, column, value)?;

                if schema.is_unique(column) {
                    let taken = staged
                        .iter()
                        .enumerate()
                        .any(|(other, row)| other != index && row.get(column) == Some(value));
                    if taken {
                        return Err(Error::UniqueViolation(column.clone()));
                    }
                }
                staged[index].insert(column.clone(), value.clone());
            }
            updated += 1;
        }

        self.write_extent(table, &staged)?;

        debug!(table, updated, "rows updated");
        self.extents.insert(table.to_string(), staged);
        Ok(updated)
    }

    /// Remove every row matching `filters`, keeping the order of the rest
    pub fn delete_rows(&mut self, catalog: &Catalog, table: &str, filters: &Filters) -> Result<usize> {
        let schema = catalog.get_table(table)?;
        check_filter_columns(schema, filters)?;

        let rows = self
            .extents
            .get(table)
            .ok_or_else(|| missing_extent(table))?;

        let kept: Vec<Row> = rows
            .iter()
            .filter(|row| !row_matches(row, filters))
            .cloned()
            .collect();
        let deleted = rows.len() - kept.len();
        self.write_extent(table, &kept)?;

        debug!(table, deleted, "rows deleted");
        self.extents.insert(table.to_string(), kept);
        Ok(deleted)
    }

    /// Remove a table's extent and its document; absence is tolerated
    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        self.extents.remove(table);
        disk::remove_document(&self.table_path(table))
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.tables_dir.join(format!("{}.json", table))
    }

    fn load_table(&self, table: &str) -> Result<Vec<Row>> {
        Ok(disk::read_document(&self.table_path(table))?.unwrap_or_default())
    }

    /// Rewrite a table's document; callers swap the extent in afterwards
    fn write_extent(&self, table: &str, rows: &[Row]) -> Result<()> {
        disk::write_document(&self.table_path(table), rows)
    }
}

fn missing_extent(table: &str) -> Error {
    Error::Storage(format!("table '{}' does not exist in storage", table))
}

fn check_filter_columns(schema: &TableSchema, filters: &Filters) -> Result<()> {
    for column in filters.keys() {
        if !schema.has_column(column) {
            return Err(Error::ColumnNotFound(
                column.clone(),
                schema.name().to_string(),
            ));
        }
    }
    Ok(())
}
