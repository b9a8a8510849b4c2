//! Engine facade
//!
//! The single entry point front-ends use: opens the data directory, sequences
//! parsing and execution, and wraps the outcome in a [`Response`] envelope.

use serde::Serialize;
use std::fs;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::{ErrorType, Result};
use crate::executor::{Executor, QueryResult};
use crate::sql::{self, CommandKind};
use crate::storage::Storage;

/// Outcome of one statement as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ok {
        command: CommandKind,
        result: QueryResult,
    },
    Error {
        error_type: ErrorType,
        message: String,
    },
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }
}

/// Database engine
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    executor: Executor,
}

impl Engine {
    /// Open (or create) a database under the configured data directory
    pub fn open(config: EngineConfig) -> Result<Self> {
        fs::create_dir_all(config.root())?;
        fs::create_dir_all(config.tables_path())?;

        let catalog = Catalog::open(config.catalog_path())?;
        let storage = Storage::open(config.tables_path(), &catalog)?;
        info!(data_dir = %config.root().display(), tables = catalog.list_tables().len(), "engine opened");

        Ok(Self {
            config,
            executor: Executor::new(catalog, storage),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        self.executor.catalog()
    }

    /// Parse and execute one statement
    pub fn execute(&mut self, sql: &str) -> Result<(CommandKind, QueryResult)> {
        let command = sql::parse(sql)?;
        let kind = command.kind();
        debug!(command = %kind, table = command.table_name(), "executing");

        let result = self.executor.execute(command)?;
        Ok((kind, result))
    }

    /// Parse and execute one statement, reporting the outcome as an envelope
    pub fn execute_sql(&mut self, sql: &str) -> Response {
        match self.execute(sql) {
            Ok((command, result)) => Response::Ok { command, result },
            Err(e) => {
                warn!(error = %e, "statement failed");
                Response::Error {
                    error_type: e.error_type(),
                    message: e.to_string(),
                }
            }
        }
    }
}
