//! Engine configuration
//!
//! Describes where the registry document and the per-table documents live.

use std::path::{Path, PathBuf};

/// Default data directory
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default registry document name
pub const DEFAULT_CATALOG_FILE: &str = "catalog.json";

/// Default subdirectory for table documents
pub const DEFAULT_TABLES_DIR: &str = "tables";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Root directory for all documents
    pub data_dir: PathBuf,
    /// Registry document file name, relative to `data_dir`
    pub catalog_file: String,
    /// Table document directory, relative to `data_dir`
    pub tables_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            catalog_file: DEFAULT_CATALOG_FILE.to_string(),
            tables_dir: DEFAULT_TABLES_DIR.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data directory
    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the registry document file name
    pub fn catalog_file(mut self, catalog_file: impl Into<String>) -> Self {
        self.catalog_file = catalog_file.into();
        self
    }

    /// Set the table document directory name
    pub fn tables_dir(mut self, tables_dir: impl Into<String>) -> Self {
        self.tables_dir = tables_dir.into();
        self
    }

    /// Full path of the registry document
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(&self.catalog_file)
    }

    /// Full path of the table document directory
    pub fn tables_path(&self) -> PathBuf {
        self.data_dir.join(&self.tables_dir)
    }

    pub fn root(&self) -> &Path {
        &self.data_dir
    }
}
