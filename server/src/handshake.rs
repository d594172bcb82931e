//! HTTP side of a connection: parsing the request head, answering an
//! upgrade request, or serving the game document to a plain browser request.

use crate::error::HandshakeError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Constant appended to the client key before hashing.
pub const WS_MAGIC: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Upper bound on the request line plus headers.
pub const MAX_HEAD_LEN: usize = 8 * 1024;

pub const FALLBACK_DOCUMENT: &[u8] =
    b"<!doctype html><title>Arena</title><h1>Game client not installed on this server</h1>";

/// A parsed request head. Header names are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    headers: HashMap<String, String>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_upgrade(&self) -> bool {
        self.header("upgrade")
            .map(|v| v.eq_ignore_ascii_case("websocket"))
            .unwrap_or(false)
    }

    pub fn websocket_key(&self) -> Result<&str, HandshakeError> {
        self.header("sec-websocket-key")
            .filter(|k| !k.is_empty())
            .ok_or(HandshakeError::MissingKey)
    }
}

/// Reads the request line and headers up to the blank line. Bytes after the
/// head stay buffered in `reader` for the frame decoder.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, HandshakeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut consumed = 0usize;
    let mut request_line = None;
    let mut headers = HashMap::new();

    loop {
        let mut line = String::new();
        let budget = (MAX_HEAD_LEN - consumed) as u64;
        let n = (&mut *reader).take(budget).read_line(&mut line).await?;
        if n == 0 {
            if consumed >= MAX_HEAD_LEN {
                return Err(HandshakeError::HeaderTooLarge(MAX_HEAD_LEN));
            }
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        consumed += n;
        if !line.ends_with('\n') {
            if consumed >= MAX_HEAD_LEN {
                return Err(HandshakeError::HeaderTooLarge(MAX_HEAD_LEN));
            }
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if request_line.is_none() {
            request_line = Some(line.to_string());
            continue;
        }
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let request_line = request_line.unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(method), Some(path)) => Ok(Request {
            method: method.to_string(),
            path: path.to_string(),
            headers,
        }),
        _ => Err(HandshakeError::Malformed(request_line)),
    }
}

/// base64(SHA-1(key + magic)).
pub fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_MAGIC.as_bytes());
    STANDARD.encode(hasher.finalize())
}

pub fn upgrade_response(key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        accept_key(key)
    )
}

pub fn document_response(body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

pub fn error_response(status: &str) -> Vec<u8> {
    format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").into_bytes()
}
