//! TableDB - interactive console

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tabledb::catalog::Catalog;
use tabledb::executor::QueryResult;
use tabledb::storage::Row;
use tabledb::{Engine, EngineConfig, ErrorType, Response};

/// TableDB console
#[derive(Parser, Debug)]
#[command(name = "tabledb-cli", version, about = "Interactive TableDB console")]
struct Args {
    /// Data directory holding the catalog and table documents
    #[arg(short = 'd', long, value_name = "DIR", default_value = "data", env = "TABLEDB_DATA_DIR")]
    data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", env = "TABLEDB_LOG_LEVEL")]
    log_level: String,
}

fn print_banner() {
    println!("TableDB console");
    println!("End statements with ';'. Type EXIT; to quit, '.help' for help.\n");
}

fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .tables            List all tables
  .schema [table]    Show table schema
  EXIT;              Exit the console

SQL Commands:
  CREATE TABLE t (id INT PRIMARY KEY, name TEXT UNIQUE, active BOOL);
  INSERT INTO t VALUES (1, 'Alice', TRUE);
  SELECT * FROM t WHERE id = 1;
  UPDATE t SET active = FALSE WHERE id = 1;
  DELETE FROM t WHERE id = 1;
  DROP TABLE t;
"#
    );
}

/// Format SELECT rows as an ASCII table
fn format_rows(rows: &[Row]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for column in row.keys() {
            if !columns.contains(&column.as_str()) {
                columns.push(column);
            }
        }
    }

    if columns.is_empty() {
        return format!("{} row(s) returned\n", rows.len());
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(*c).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+\n", separator);

    let mut output = String::new();
    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!(" {:^width$} ", c, width = *w))
        .collect::<Vec<_>>()
        .join("|");
    output.push_str(&format!("|{}|\n", header));
    output.push_str(&separator);

    for row in &cells {
        let line: String = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!(" {:>width$} ", v, width = *w))
            .collect::<Vec<_>>()
            .join("|");
        output.push_str(&format!("|{}|\n", line));
    }
    output.push_str(&separator);

    output.push_str(&format!("{} row(s) returned\n", rows.len()));
    output
}

fn print_response(response: Response) {
    match response {
        Response::Ok {
            result: QueryResult::Rows(rows),
            ..
        } => print!("{}", format_rows(&rows)),
        Response::Ok { result, .. } => println!("{}", result),
        Response::Error {
            error_type: ErrorType::Parse,
            message,
        } => eprintln!("{}", message),
        Response::Error { message, .. } => eprintln!("Execution error: {}", message),
    }
}

/// Handle dot commands
fn handle_special_command(cmd: &str, catalog: &Catalog) {
    let parts: Vec<&str> = cmd.split_whitespace().collect();

    match parts.first().copied() {
        Some(".help") => print_help(),
        Some(".tables") => {
            let tables = catalog.list_tables();
            if tables.is_empty() {
                println!("No tables found.");
            } else {
                println!("Tables:");
                for table in tables {
                    println!("  {}", table);
                }
            }
        }
        Some(".schema") => {
            let tables = match parts.get(1) {
                Some(table) => vec![*table],
                None => catalog.list_tables(),
            };
            for table in tables {
                match catalog.describe_table(table) {
                    Ok(info) => println!("{}", info),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
        }
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Type '.help' for available commands.");
        }
        None => {}
    }
}

fn run_repl(engine: &mut Engine) -> Result<()> {
    let mut editor = DefaultEditor::new().context("Failed to initialise line editor")?;
    let mut buffer = String::new();

    print_banner();

    loop {
        let prompt = if buffer.is_empty() { "db> " } else { "...> " };
        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Err(e) = editor.add_history_entry(trimmed) {
            debug!(error = %e, "history entry not recorded");
        }

        if buffer.is_empty() && trimmed.starts_with('.') {
            handle_special_command(trimmed, engine.catalog());
            continue;
        }

        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(trimmed);

        if !trimmed.contains(';') {
            continue;
        }

        let sql = std::mem::take(&mut buffer);
        if sql.trim().eq_ignore_ascii_case("EXIT;") {
            break;
        }

        print_response(engine.execute_sql(&sql));
    }

    println!("Bye!");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("tabledb={}", args.log_level)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::new().data_dir(&args.data_dir);
    let mut engine = Engine::open(config)
        .with_context(|| format!("Failed to open database in {}", args.data_dir.display()))?;

    run_repl(&mut engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabledb::storage::Value;

    #[test]
    fn test_format_rows() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::Integer(1));
        row.insert("name".to_string(), Value::from("Alice"));

        let output = format_rows(&[row]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "+----+-------+");
        assert_eq!(lines[1], "| id | name  |");
        assert_eq!(lines[3], "|  1 | Alice |");
        assert_eq!(lines[5], "1 row(s) returned");
    }

    #[test]
    fn test_format_no_rows() {
        assert_eq!(format_rows(&[]), "0 row(s) returned\n");
    }
}
