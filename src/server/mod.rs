//! HTTP Server for TableDB
//!
//! This module implements a small HTTP/1.1 front-end over the engine. Each
//! connection carries one request; statements from all connections are
//! serialized through a single engine lock.
//!
//! Routes:
//! - `GET /` returns usage text
//! - `POST /query` executes one statement, sent either as the raw body or as
//!   the `sql` field of a form-encoded body

use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::engine::{Engine, Response};
use crate::error::Result;

/// Default server port
pub const DEFAULT_PORT: u16 = 7171;

/// Default request body limit
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

const MAX_HEADER_LINES: usize = 100;

/// Longest accepted request or header line, terminator included
const MAX_LINE_BYTES: usize = 8 * 1024;

const USAGE: &str = "TableDB HTTP server\n\n\
POST /query with one SQL statement as the request body, or as the `sql`\n\
field of an application/x-www-form-urlencoded body.\n\n\
Successful statements return 200 {\"result\": ...}.\n\
Failed statements return 400 {\"error\": \"...\"}.\n";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Create a new server config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the request body limit
    pub fn max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Get the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TableDB HTTP server
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    engine: Arc<Mutex<Engine>>,
}

impl Server {
    /// Bind the listening socket
    pub async fn bind(config: ServerConfig, engine: Engine) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        Ok(Self {
            config,
            listener,
            engine: Arc::new(Mutex::new(engine)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the task is dropped
    pub async fn run(self) -> Result<()> {
        info!("TableDB server listening on {}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("Accepted connection from {}", addr);
                    let engine = Arc::clone(&self.engine);
                    let max_body_bytes = self.config.max_body_bytes;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, engine, max_body_bytes).await {
                            warn!("Connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// A parsed HTTP request
#[derive(Debug, Clone, PartialEq)]
struct Request {
    method: String,
    path: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

/// An HTTP response ready to be written
#[derive(Debug, Clone, PartialEq)]
struct HttpResponse {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl HttpResponse {
    fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "error": message.into() }))
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            413 => "Payload Too Large",
            _ => "Internal Server Error",
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len(),
            self.body
        )
        .into_bytes()
    }
}

enum ReadOutcome {
    Request(Request),
    /// Peer closed before sending a request line
    Closed,
    /// Malformed or oversized request; answer and close
    Rejected(HttpResponse),
}

async fn handle_connection(
    stream: TcpStream,
    engine: Arc<Mutex<Engine>>,
    max_body_bytes: usize,
) -> Result<()> {
    let mut reader = BufReader::new(stream);

    let response = match read_request(&mut reader, max_body_bytes).await? {
        ReadOutcome::Request(request) => {
            debug!(method = %request.method, path = %request.path, "request");
            route(request, engine).await
        }
        ReadOutcome::Closed => return Ok(()),
        ReadOutcome::Rejected(response) => response,
    };

    let mut stream = reader.into_inner();
    stream.write_all(&response.to_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// Read one request: request line, headers, then a Content-Length body
async fn read_request<R>(reader: &mut R, max_body_bytes: usize) -> std::io::Result<ReadOutcome>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    match read_bounded_line(reader, &mut line).await? {
        Some(0) => return Ok(ReadOutcome::Closed),
        Some(_) => {}
        None => return Ok(ReadOutcome::Rejected(line_too_long())),
    }

    let mut parts = line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next()) {
        (Some(method), Some(target)) => (method.to_string(), target.to_string()),
        _ => {
            return Ok(ReadOutcome::Rejected(HttpResponse::error(
                400,
                "Malformed request line",
            )))
        }
    };
    let path = target.split('?').next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    let mut content_type = None;
    let mut header_lines = 0;
    loop {
        match read_bounded_line(reader, &mut line).await? {
            Some(0) => break,
            Some(_) => {}
            None => return Ok(ReadOutcome::Rejected(line_too_long())),
        }
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        header_lines += 1;
        if header_lines > MAX_HEADER_LINES {
            return Ok(ReadOutcome::Rejected(HttpResponse::error(
                400,
                "Too many headers",
            )));
        }

        let Some((name, value)) = header.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = match value.parse() {
                Ok(n) => n,
                Err(_) => {
                    return Ok(ReadOutcome::Rejected(HttpResponse::error(
                        400,
                        "Invalid Content-Length",
                    )))
                }
            };
        } else if name.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.to_ascii_lowercase());
        }
    }

    if content_length > max_body_bytes {
        return Ok(ReadOutcome::Rejected(HttpResponse::error(
            413,
            format!("Request body exceeds {} bytes", max_body_bytes),
        )));
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;

    Ok(ReadOutcome::Request(Request {
        method,
        path,
        content_type,
        body,
    }))
}

/// Read one line into `line`, replacing its contents
///
/// Returns `None` when the line runs past `MAX_LINE_BYTES` without a newline.
async fn read_bounded_line<R>(reader: &mut R, line: &mut String) -> std::io::Result<Option<usize>>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let limit = MAX_LINE_BYTES as u64;
    let read = (&mut *reader).take(limit).read_line(line).await?;
    if read as u64 == limit && !line.ends_with('\n') {
        return Ok(None);
    }
    Ok(Some(read))
}

fn line_too_long() -> HttpResponse {
    HttpResponse::error(400, format!("Request line exceeds {} bytes", MAX_LINE_BYTES))
}

async fn route(request: Request, engine: Arc<Mutex<Engine>>) -> HttpResponse {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") => HttpResponse::text(200, USAGE),
        ("POST", "/query") => {
            let sql = match statement_text(&request) {
                Ok(sql) => sql,
                Err(response) => return response,
            };
            if sql.is_empty() {
                return HttpResponse::error(400, "Empty query");
            }
            run_statement(sql, engine).await
        }
        _ => HttpResponse::error(404, "Not found"),
    }
}

/// Pull the statement out of a `/query` body
fn statement_text(request: &Request) -> std::result::Result<String, HttpResponse> {
    let body = std::str::from_utf8(&request.body)
        .map_err(|_| HttpResponse::error(400, "Request body is not valid UTF-8"))?;

    let is_form = request
        .content_type
        .as_deref()
        .map_or(false, |ct| ct.starts_with("application/x-www-form-urlencoded"));

    let sql = if is_form {
        form_field(body, "sql").unwrap_or_default()
    } else {
        body.to_string()
    };
    Ok(sql.trim().to_string())
}

/// Execute on a blocking thread; the engine does synchronous file I/O
async fn run_statement(sql: String, engine: Arc<Mutex<Engine>>) -> HttpResponse {
    let outcome = tokio::task::spawn_blocking(move || {
        let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
        engine.execute_sql(&sql)
    })
    .await;

    match outcome {
        Ok(Response::Ok { result, .. }) => HttpResponse::json(200, json!({ "result": result })),
        Ok(Response::Error { message, .. }) => HttpResponse::error(400, message),
        Err(e) => {
            error!("Statement task failed: {}", e);
            HttpResponse::error(500, "Internal server error")
        }
    }
}

/// Find and decode one field of an `application/x-www-form-urlencoded` body
fn form_field(body: &str, name: &str) -> Option<String> {
    body.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (decode_form_component(key) == name).then(|| decode_form_component(value))
    })
}

fn decode_form_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let decoded = match (bytes.get(i + 1), bytes.get(i + 2)) {
                    (Some(&high), Some(&low)) => hex_pair(high, low),
                    _ => None,
                };
                match decoded {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(high: u8, low: u8) -> Option<u8> {
    let high = (high as char).to_digit(16)?;
    let low = (low as char).to_digit(16)?;
    Some((high * 16 + low) as u8)
}
