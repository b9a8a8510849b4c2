//! TableDB - a minimal single-node relational engine
//!
//! Tables are typed, declared with a primary key and optional unique
//! columns, and persisted as JSON documents under a data directory:
//! - SQL parsing (lexer, parser, AST)
//! - System catalog (schemas and value validation)
//! - Row storage (one document per table)
//! - Command execution and the [`Engine`] facade
//! - HTTP server

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod server;
pub mod sql;
pub mod storage;

pub use config::EngineConfig;
pub use engine::{Engine, Response};
pub use error::{Error, ErrorType, Result};
