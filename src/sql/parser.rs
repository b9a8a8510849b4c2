//! SQL Parser
//!
//! This module parses statement text into a `Command`. Statements are
//! dispatched on their case-insensitive leading keywords; clause boundaries
//! are found with the quote-aware scanner in `lexer` and the pieces are
//! recognized with `nom` combinators.

use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, digit1, multispace0, multispace1, satisfy},
    combinator::{all_consuming, map, map_res, not, opt, recognize, rest, verify},
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use super::ast::*;
use super::lexer::{split_at_keyword, split_top_level, strip_terminator};
use crate::error::{Error, Result};
use crate::storage::Value;

type ParseResult<'a, T> = IResult<&'a str, T>;

/// SQL Parser
pub struct Parser<'a> {
    sql: &'a str,
}

impl<'a> Parser<'a> {
    /// Create a new parser for one statement; a trailing `;` is ignored
    pub fn new(sql: &'a str) -> Self {
        Self {
            sql: strip_terminator(sql),
        }
    }

    /// Parse the statement
    pub fn parse(&self) -> Result<Command> {
        let sql = self.sql;

        if let Some(rest) = leading_keywords(sql, &["CREATE", "TABLE"]) {
            return self.parse_create_table(rest).map(Command::CreateTable);
        }
        if let Some(rest) = leading_keywords(sql, &["INSERT", "INTO"]) {
            return self.parse_insert(rest).map(Command::Insert);
        }
        if let Some(rest) = leading_keywords(sql, &["SELECT"]) {
            return self.parse_select(rest).map(Command::Select);
        }
        if let Some(rest) = leading_keywords(sql, &["UPDATE"]) {
            return self.parse_update(rest).map(Command::Update);
        }
        if let Some(rest) = leading_keywords(sql, &["DELETE", "FROM"]) {
            return self.parse_delete(rest).map(Command::Delete);
        }
        if let Some(rest) = leading_keywords(sql, &["DROP", "TABLE"]) {
            return self.parse_drop_table(rest).map(Command::DropTable);
        }

        Err(Error::Parse(
            "unsupported statement, expected CREATE TABLE, INSERT INTO, SELECT, UPDATE, DELETE FROM or DROP TABLE"
                .to_string(),
        ))
    }

    // ========== CREATE TABLE ==========

    fn parse_create_table(&self, input: &str) -> Result<CreateTableCommand> {
        let (body, table_name) =
            create_table_head(input).map_err(|_| syntax_error("CREATE TABLE"))?;
        let body = body
            .trim_end()
            .strip_suffix(')')
            .ok_or_else(|| syntax_error("CREATE TABLE"))?;

        let mut columns = Vec::new();
        let mut primary_key: Option<String> = None;
        let mut unique_columns: Vec<String> = Vec::new();

        for def in split_top_level(body, ',') {
            let mut parts = def.split_whitespace();
            let (name, type_name) = match (parts.next(), parts.next()) {
                (Some(name), Some(type_name)) if is_identifier(name) => (name, type_name),
                _ => {
                    return Err(Error::Parse(format!(
                        "invalid column definition '{}'",
                        def
                    )))
                }
            };

            let mut primary = false;
            let mut unique = false;
            let mut modifiers = parts.peekable();
            while let Some(modifier) = modifiers.next() {
                if modifier.eq_ignore_ascii_case("PRIMARY") {
                    primary = true;
                    if modifiers
                        .peek()
                        .map_or(false, |next| next.eq_ignore_ascii_case("KEY"))
                    {
                        modifiers.next();
                    }
                } else if modifier.eq_ignore_ascii_case("UNIQUE") {
                    unique = true;
                } else {
                    return Err(Error::Parse(format!(
                        "unexpected '{}' in column definition '{}'",
                        modifier, def
                    )));
                }
            }

            if primary {
                if primary_key.is_some() {
                    return Err(Error::Parse(
                        "multiple primary keys are not allowed".to_string(),
                    ));
                }
                primary_key = Some(name.to_string());
            }
            if unique && !unique_columns.iter().any(|c| c == name) {
                unique_columns.push(name.to_string());
            }

            columns.push(ColumnDef {
                name: name.to_string(),
                type_name: type_name.to_string(),
            });
        }

        let primary_key = primary_key
            .ok_or_else(|| Error::Parse("no primary key defined in CREATE TABLE".to_string()))?;
        if !unique_columns.contains(&primary_key) {
            unique_columns.push(primary_key.clone());
        }

        Ok(CreateTableCommand {
            table_name: table_name.to_string(),
            columns,
            primary_key,
            unique_columns,
        })
    }

    // ========== INSERT INTO ==========

    fn parse_insert(&self, input: &str) -> Result<InsertCommand> {
        let (body, table_name) = insert_head(input).map_err(|_| syntax_error("INSERT INTO"))?;
        let body = body
            .trim_end()
            .strip_suffix(')')
            .ok_or_else(|| syntax_error("INSERT INTO"))?;

        let values = split_top_level(body, ',')
            .into_iter()
            .map(parse_value)
            .collect::<Result<Vec<_>>>()?;

        Ok(InsertCommand {
            table_name: table_name.to_string(),
            values,
        })
    }

    // ========== SELECT ==========

    fn parse_select(&self, input: &str) -> Result<SelectCommand> {
        let (columns_part, rest) =
            split_at_keyword(input, "FROM").ok_or_else(|| syntax_error("SELECT"))?;

        let columns_part = columns_part.trim();
        let projection = if columns_part == "*" {
            Projection::Wildcard
        } else {
            let columns = split_top_level(columns_part, ',');
            if columns.iter().any(|c| !is_identifier(c)) {
                return Err(syntax_error("SELECT"));
            }
            Projection::Columns(columns.into_iter().map(String::from).collect())
        };

        let (rest, table_name) = spaced_identifier(rest).map_err(|_| syntax_error("SELECT"))?;
        let rest = rest.trim();
        let predicate = if rest.is_empty() {
            None
        } else {
            Some(parse_where_clause(rest)?)
        };

        Ok(SelectCommand {
            table_name: table_name.to_string(),
            projection,
            predicate,
        })
    }

    // ========== UPDATE ==========

    fn parse_update(&self, input: &str) -> Result<UpdateCommand> {
        let (rest, table_name) = update_head(input).map_err(|_| syntax_error("UPDATE"))?;
        let (set_part, where_part) = split_at_keyword(rest, "WHERE")
            .ok_or_else(|| Error::Parse("UPDATE requires a WHERE clause".to_string()))?;

        let mut assignments = IndexMap::new();
        for item in split_top_level(set_part, ',') {
            let (value, column) = assignment_target(item)
                .map_err(|_| Error::Parse(format!("invalid SET expression '{}'", item)))?;
            if assignments
                .insert(column.to_string(), operand(value)?)
                .is_some()
            {
                return Err(Error::Parse(format!(
                    "column '{}' assigned more than once",
                    column
                )));
            }
        }

        Ok(UpdateCommand {
            table_name: table_name.to_string(),
            assignments,
            predicate: parse_predicate(where_part)?,
        })
    }

    // ========== DELETE FROM ==========

    fn parse_delete(&self, input: &str) -> Result<DeleteCommand> {
        let (rest, table_name) = spaced_identifier(input).map_err(|_| syntax_error("DELETE"))?;
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(Error::Parse("DELETE requires a WHERE clause".to_string()));
        }

        Ok(DeleteCommand {
            table_name: table_name.to_string(),
            predicate: parse_where_clause(rest)?,
        })
    }

    // ========== DROP TABLE ==========

    fn parse_drop_table(&self, input: &str) -> Result<DropTableCommand> {
        let (_, table_name) =
            all_consuming(spaced_identifier)(input).map_err(|_| syntax_error("DROP TABLE"))?;

        Ok(DropTableCommand {
            table_name: table_name.to_string(),
        })
    }
}

/// Parse a value literal: `'text'`, `TRUE`/`FALSE` (any case), or `-?[0-9]+`
///
/// Text literals have no escape processing; everything between the first
/// and last quote is the text.
pub fn parse_value(token: &str) -> Result<Value> {
    let token = token.trim();
    all_consuming(literal)(token)
        .map(|(_, value)| value)
        .map_err(|_| Error::Parse(format!("cannot parse value: {}", token)))
}

fn parse_where_clause(input: &str) -> Result<Predicate> {
    let (predicate, _) = where_keyword(input)
        .map_err(|_| Error::Parse(format!("unexpected clause '{}'", input)))?;
    parse_predicate(predicate)
}

fn parse_predicate(input: &str) -> Result<Predicate> {
    let unsupported =
        || Error::Parse("unsupported WHERE clause, only 'column = value' is supported".to_string());

    let (value, column) = assignment_target(input.trim()).map_err(|_| unsupported())?;
    let value = operand(value).map_err(|_| unsupported())?;

    Ok(Predicate {
        column: column.to_string(),
        value,
    })
}

/// The right-hand side of `column = value`; a trailing AND/OR is rejected
fn operand(text: &str) -> Result<Value> {
    let text = text.trim();
    let padded = format!(" {}", text);
    for conjunction in ["AND", "OR"] {
        if split_at_keyword(&padded, conjunction).is_some() {
            return Err(Error::Parse(format!(
                "unexpected {} in '{}', only one 'column = value' is supported",
                conjunction, text
            )));
        }
    }
    parse_value(text)
}

fn syntax_error(statement: &str) -> Error {
    Error::Parse(format!("invalid {} syntax", statement))
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_identifier_char)
}

/// Match a sequence of keywords separated by whitespace at the start of input
fn leading_keywords<'a>(input: &'a str, words: &[&'static str]) -> Option<&'a str> {
    let mut rest = input;
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            rest = multispace1::<&str, nom::error::Error<&str>>(rest).ok()?.0;
        }
        rest = keyword(*word)(rest).ok()?.0;
    }
    Some(rest)
}

// ========== Grammar pieces ==========

fn identifier(input: &str) -> ParseResult<'_, &str> {
    take_while1(is_identifier_char)(input)
}

fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> ParseResult<'a, &'a str> {
    terminated(tag_no_case(kw), not(satisfy(is_identifier_char)))
}

fn spaced_identifier(input: &str) -> ParseResult<'_, &str> {
    preceded(multispace1, identifier)(input)
}

/// `<ws> name <ws>? (` ; leaves the column definitions and closing paren
fn create_table_head(input: &str) -> ParseResult<'_, &str> {
    let (input, (name, _, _)) = tuple((spaced_identifier, multispace0, char('(')))(input)?;
    Ok((input, name))
}

/// `<ws> name <ws> VALUES <ws>? (` ; leaves the values and closing paren
fn insert_head(input: &str) -> ParseResult<'_, &str> {
    let (input, (name, _, _, _, _)) = tuple((
        spaced_identifier,
        multispace1,
        keyword("VALUES"),
        multispace0,
        char('('),
    ))(input)?;
    Ok((input, name))
}

/// `<ws> name <ws> SET <ws>` ; leaves the assignments and WHERE clause
fn update_head(input: &str) -> ParseResult<'_, &str> {
    let (input, (name, _, _, _)) =
        tuple((spaced_identifier, multispace1, keyword("SET"), multispace1))(input)?;
    Ok((input, name))
}

fn where_keyword(input: &str) -> ParseResult<'_, &str> {
    terminated(keyword("WHERE"), multispace1)(input)
}

/// `column <ws>? = <ws>?` ; leaves the value text
fn assignment_target(input: &str) -> ParseResult<'_, &str> {
    terminated(identifier, tuple((multispace0, char('='), multispace0)))(input)
}

fn literal(input: &str) -> ParseResult<'_, Value> {
    alt((
        map(
            preceded(char('\''), verify(rest, |s: &str| s.ends_with('\''))),
            |quoted: &str| Value::Text(quoted[..quoted.len() - 1].to_string()),
        ),
        map(keyword("TRUE"), |_| Value::Boolean(true)),
        map(keyword("FALSE"), |_| Value::Boolean(false)),
        map_res(recognize(pair(opt(char('-')), digit1)), |digits: &str| {
            digits.parse::<i64>().map(Value::Integer)
        }),
    ))(input)
}
