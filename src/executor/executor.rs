//! Command Executor for TableDB
//!
//! This module binds the catalog and the row storage: it receives a parsed
//! command, calls both in the right order, and returns a result.

use tracing::{debug, info, warn};

use super::result::QueryResult;
use crate::catalog::{Catalog, TableSchema};
use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::storage::{Row, Storage};

/// Execution Engine
#[derive(Debug)]
pub struct Executor {
    /// System catalog
    catalog: Catalog,
    /// Table storage
    storage: Storage,
}

impl Executor {
    /// Create a new executor over a loaded catalog and storage
    pub fn new(catalog: Catalog, storage: Storage) -> Self {
        Self { catalog, storage }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Execute a parsed command
    pub fn execute(&mut self, command: Command) -> Result<QueryResult> {
        match command {
            Command::CreateTable(c) => self.execute_create_table(c),
            Command::Insert(c) => self.execute_insert(c),
            Command::Select(c) => self.execute_select(c),
            Command::Update(c) => self.execute_update(c),
            Command::Delete(c) => self.execute_delete(c),
            Command::DropTable(c) => self.execute_drop_table(c),
        }
    }

    /// Validate the schema, register it, then allocate its extent
    ///
    /// No extent is allocated unless the schema is valid and registered.
    fn execute_create_table(&mut self, command: CreateTableCommand) -> Result<QueryResult> {
        let columns: Vec<(String, String)> = command
            .columns
            .into_iter()
            .map(|c| (c.name, c.type_name))
            .collect();
        let schema = TableSchema::new(
            &command.table_name,
            &columns,
            &command.primary_key,
            &command.unique_columns,
        )?;
        let table = schema.name().to_string();

        self.catalog.create_table(schema)?;
        if let Err(e) = self.storage.create_table(&table) {
            warn!(table = %table, error = %e, "storage allocation failed, unregistering table");
            self.catalog.drop_table(&table)?;
            return Err(e);
        }

        info!(table = %table, "table created");
        Ok(QueryResult::Created { table })
    }

    /// Bind positional values to columns in declaration order and insert
    fn execute_insert(&mut self, command: InsertCommand) -> Result<QueryResult> {
        let schema = self.catalog.get_table(&command.table_name)?;
        if command.values.len() != schema.column_count() {
            return Err(Error::ValueCountMismatch {
                expected: schema.column_count(),
                found: command.values.len(),
            });
        }

        let row: Row = schema
            .column_names()
            .map(String::from)
            .zip(command.values)
            .collect();
        self.storage
            .insert_row(&self.catalog, &command.table_name, row)?;

        Ok(QueryResult::Inserted {
            table: command.table_name,
            rows_affected: 1,
        })
    }

    /// Query and project
    ///
    /// Requested columns a row does not have are left out of that row.
    fn execute_select(&mut self, command: SelectCommand) -> Result<QueryResult> {
        let rows =
            self.storage
                .query_rows(&self.catalog, &command.table_name, &command.filters())?;

        let rows = match &command.projection {
            Projection::Wildcard => rows,
            Projection::Columns(columns) => rows
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                        .collect()
                })
                .collect(),
        };

        debug!(table = %command.table_name, rows = rows.len(), "select");
        Ok(QueryResult::Rows(rows))
    }

    fn execute_update(&mut self, command: UpdateCommand) -> Result<QueryResult> {
        let rows_affected = self.storage.update_rows(
            &self.catalog,
            &command.table_name,
            &command.assignments,
            &command.predicate.to_filters(),
        )?;

        Ok(QueryResult::Updated {
            table: command.table_name,
            rows_affected,
        })
    }

    fn execute_delete(&mut self, command: DeleteCommand) -> Result<QueryResult> {
        let rows_affected = self.storage.delete_rows(
            &self.catalog,
            &command.table_name,
            &command.predicate.to_filters(),
        )?;

        Ok(QueryResult::Deleted {
            table: command.table_name,
            rows_affected,
        })
    }

    /// Remove the extent, then the catalog entry if still present
    fn execute_drop_table(&mut self, command: DropTableCommand) -> Result<QueryResult> {
        let table = command.table_name;
        let existed = self.catalog.table_exists(&table) || self.storage.has_table(&table);

        self.storage.drop_table(&table)?;
        if self.catalog.table_exists(&table) {
            self.catalog.drop_table(&table)?;
        }

        info!(table = %table, existed, "table dropped");
        Ok(QueryResult::Dropped { table, existed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql;
    use crate::storage::Value;
    use tempfile::TempDir;

    fn executor(dir: &TempDir) -> Executor {
        let catalog = Catalog::open(dir.path().join("catalog.json")).unwrap();
        let storage = Storage::open(dir.path().join("tables"), &catalog).unwrap();
        Executor::new(catalog, storage)
    }

    fn run(executor: &mut Executor, sql: &str) -> Result<QueryResult> {
        executor.execute(sql::parse(sql)?)
    }

    #[test]
    fn test_create_table() {
        let dir = TempDir::new().unwrap();
        let mut executor = executor(&dir);

        let result = run(&mut executor, "CREATE TABLE users (id INT PRIMARY, name TEXT)").unwrap();
        assert_eq!(
            result,
            QueryResult::Created {
                table: "users".to_string()
            }
        );
        assert!(executor.catalog().table_exists("users"));
        assert_eq!(executor.storage().row_count("users"), Some(0));
    }

    #[test]
    fn test_invalid_schema_allocates_no_extent() {
        let dir = TempDir::new().unwrap();
        let mut executor = executor(&dir);

        for sql in [
            "CREATE TABLE t (id FLOAT PRIMARY)",
            "CREATE TABLE t (id INT PRIMARY, id TEXT)",
        ] {
            let err = run(&mut executor, sql).unwrap_err();
            assert!(matches!(err, Error::Schema(_)), "{}", err);
            assert!(!executor.catalog().table_exists("t"));
            assert!(!executor.storage().has_table("t"));
        }
    }

    #[test]
    fn test_duplicate_table_keeps_existing_rows() {
        let dir = TempDir::new().unwrap();
        let mut executor = executor(&dir);

        run(&mut executor, "CREATE TABLE t (id INT PRIMARY)").unwrap();
        run(&mut executor, "INSERT INTO t VALUES (1)").unwrap();

        let err = run(&mut executor, "CREATE TABLE t (id INT PRIMARY)").unwrap_err();
        assert!(matches!(err, Error::TableAlreadyExists(_)));
        assert_eq!(executor.storage().row_count("t"), Some(1));
    }

    #[test]
    fn test_create_rolls_back_when_storage_fails() {
        let dir = TempDir::new().unwrap();
        let mut executor = executor(&dir);

        let blocker = dir.path().join("tables").join("t.json");
        std::fs::create_dir(&blocker).unwrap();
        assert!(run(&mut executor, "CREATE TABLE t (id INT PRIMARY)").is_err());
        assert!(!executor.catalog().table_exists("t"));
        assert!(!executor.storage().has_table("t"));

        std::fs::remove_dir(&blocker).unwrap();
        run(&mut executor, "CREATE TABLE t (id INT PRIMARY)").unwrap();
        assert_eq!(executor.storage().row_count("t"), Some(0));
    }

    #[test]
    fn test_insert_value_count_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut executor = executor(&dir);
        run(&mut executor, "CREATE TABLE t (id INT PRIMARY, n TEXT)").unwrap();

        let err = run(&mut executor, "INSERT INTO t VALUES (1)").unwrap_err();
        assert!(matches!(
            err,
            Error::ValueCountMismatch {
                expected: 2,
                found: 1
            }
        ));
        let err = run(&mut executor, "INSERT INTO t VALUES (1, 'a', TRUE)").unwrap_err();
        assert!(matches!(err, Error::ValueCountMismatch { .. }));
        assert_eq!(executor.storage().row_count("t"), Some(0));
    }

    #[test]
    fn test_insert_unknown_table() {
        let dir = TempDir::new().unwrap();
        let mut executor = executor(&dir);

        let err = run(&mut executor, "INSERT INTO ghosts VALUES (1)").unwrap_err();
        assert!(matches!(err, Error::TableNotFound(_)));
    }

    #[test]
    fn test_select_projection() {
        let dir = TempDir::new().unwrap();
        let mut executor = executor(&dir);
        run(
            &mut executor,
            "CREATE TABLE users (id INT PRIMARY, name TEXT UNIQUE, active BOOL)",
        )
        .unwrap();
        run(&mut executor, "INSERT INTO users VALUES (1, 'Alice', TRUE)").unwrap();
        run(&mut executor, "INSERT INTO users VALUES (2, 'Bob', FALSE)").unwrap();

        let result = run(&mut executor, "SELECT active, name, nickname FROM users WHERE id = 2").unwrap();
        let rows = result.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["active", "name"]);
        assert_eq!(rows[0]["active"], Value::Boolean(false));
    }

    #[test]
    fn test_update_and_delete_counts() {
        let dir = TempDir::new().unwrap();
        let mut executor = executor(&dir);
        run(&mut executor, "CREATE TABLE t (id INT PRIMARY, flag BOOL)").unwrap();
        for i in 1..=4 {
            run(
                &mut executor,
                &format!("INSERT INTO t VALUES ({}, {})", i, i % 2 == 0),
            )
            .unwrap();
        }

        let updated = run(&mut executor, "UPDATE t SET flag = TRUE WHERE flag = FALSE").unwrap();
        assert_eq!(updated.rows_affected(), Some(2));

        let deleted = run(&mut executor, "DELETE FROM t WHERE flag = TRUE").unwrap();
        assert_eq!(deleted.rows_affected(), Some(4));
        assert_eq!(executor.storage().row_count("t"), Some(0));
    }

    #[test]
    fn test_drop_table() {
        let dir = TempDir::new().unwrap();
        let mut executor = executor(&dir);
        run(&mut executor, "CREATE TABLE t (id INT PRIMARY)").unwrap();

        let result = run(&mut executor, "DROP TABLE t").unwrap();
        assert_eq!(
            result,
            QueryResult::Dropped {
                table: "t".to_string(),
                existed: true
            }
        );
        assert!(matches!(
            run(&mut executor, "SELECT * FROM t"),
            Err(Error::TableNotFound(_))
        ));

        // Dropping again is harmless
        let result = run(&mut executor, "DROP TABLE t").unwrap();
        assert_eq!(
            result,
            QueryResult::Dropped {
                table: "t".to_string(),
                existed: false
            }
        );
    }
}
