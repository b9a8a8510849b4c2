//! Parsed statement representation
//!
//! A statement parses into exactly one `Command`, each variant carrying only
//! the fields its statement type needs.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::storage::{Filters, Value};

/// A parsed SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// CREATE TABLE statement
    CreateTable(CreateTableCommand),
    /// INSERT INTO statement
    Insert(InsertCommand),
    /// SELECT statement
    Select(SelectCommand),
    /// UPDATE statement
    Update(UpdateCommand),
    /// DELETE FROM statement
    Delete(DeleteCommand),
    /// DROP TABLE statement
    DropTable(DropTableCommand),
}

impl Command {
    /// The statement kind, as reported in responses
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CreateTable(_) => CommandKind::CreateTable,
            Command::Insert(_) => CommandKind::Insert,
            Command::Select(_) => CommandKind::Select,
            Command::Update(_) => CommandKind::Update,
            Command::Delete(_) => CommandKind::Delete,
            Command::DropTable(_) => CommandKind::DropTable,
        }
    }

    /// The table this command targets
    pub fn table_name(&self) -> &str {
        match self {
            Command::CreateTable(c) => &c.table_name,
            Command::Insert(c) => &c.table_name,
            Command::Select(c) => &c.table_name,
            Command::Update(c) => &c.table_name,
            Command::Delete(c) => &c.table_name,
            Command::DropTable(c) => &c.table_name,
        }
    }
}

/// Statement kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    CreateTable,
    Insert,
    Select,
    Update,
    Delete,
    DropTable,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CreateTable => "CREATE_TABLE",
            CommandKind::Insert => "INSERT",
            CommandKind::Select => "SELECT",
            CommandKind::Update => "UPDATE",
            CommandKind::Delete => "DELETE",
            CommandKind::DropTable => "DROP_TABLE",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Column definition as written in CREATE TABLE
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Type name, unvalidated (validated when the schema is built)
    pub type_name: String,
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableCommand {
    pub table_name: String,
    /// Column definitions in declaration order
    pub columns: Vec<ColumnDef>,
    pub primary_key: String,
    /// Unique columns; always includes the primary key
    pub unique_columns: Vec<String>,
}

/// INSERT INTO statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertCommand {
    pub table_name: String,
    /// Positional values, bound to columns in declaration order
    pub values: Vec<Value>,
}

/// SELECT projection
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// All columns (*)
    Wildcard,
    /// Named columns
    Columns(Vec<String>),
}

/// A single `column = value` equality test
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub value: Value,
}

impl Predicate {
    /// Convert to storage filters
    pub fn to_filters(&self) -> Filters {
        let mut filters = Filters::with_capacity(1);
        filters.insert(self.column.clone(), self.value.clone());
        filters
    }
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectCommand {
    pub table_name: String,
    pub projection: Projection,
    /// Optional WHERE clause; `None` matches every row
    pub predicate: Option<Predicate>,
}

impl SelectCommand {
    pub fn filters(&self) -> Filters {
        self.predicate
            .as_ref()
            .map(Predicate::to_filters)
            .unwrap_or_default()
    }
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCommand {
    pub table_name: String,
    /// SET assignments in statement order
    pub assignments: IndexMap<String, Value>,
    pub predicate: Predicate,
}

/// DELETE FROM statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteCommand {
    pub table_name: String,
    pub predicate: Predicate,
}

/// DROP TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableCommand {
    pub table_name: String,
}
