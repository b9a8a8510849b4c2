//! SQL module
//!
//! This module contains the statement scanner, parser, and parsed command types.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Command, CommandKind, Predicate, Projection};
pub use parser::{parse_value, Parser};

use crate::error::Result;

/// Parse one statement into a command
pub fn parse(sql: &str) -> Result<Command> {
    Parser::new(sql).parse()
}
