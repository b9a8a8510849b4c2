//! Storage engine module
//!
//! This module contains the value model, document persistence, and the
//! per-table row storage.

pub mod disk;
pub mod store;
pub mod value;

pub use store::Storage;
pub use value::{row_matches, Filters, Row, Value};
