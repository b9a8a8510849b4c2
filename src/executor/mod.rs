//! Command execution module
//!
//! This module contains the executor and its result type.

pub mod executor;
pub mod result;

pub use executor::Executor;
pub use result::QueryResult;
