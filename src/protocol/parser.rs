//! HTTP request parsing
//!
//! Parses the request line and header lines read from the connection,
//! resolves the routing path from the request target, and decodes POST
//! bodies into flat string maps.

use std::collections::HashMap;

use serde_json::{Number, Value};
use url::Url;

use crate::error::HttpError;
use crate::protocol::request::Body;

/// Request line and headers of an inbound request, before routing.
#[derive(Debug, Clone, Default)]
pub struct RequestHead {
    pub method: String,
    pub target: String,
    pub headers: HashMap<String, String>,
}

impl RequestHead {
    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Declared body length. A missing `Content-Length` means an empty body.
    pub fn content_length(&self) -> Result<usize, HttpError> {
        match self.header("content-length") {
            None => Ok(0),
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                HttpError::MalformedRequest(format!("invalid Content-Length: {}", raw))
            }),
        }
    }

    /// How the body is delimited. `Transfer-Encoding` takes precedence over
    /// `Content-Length`; only a final `chunked` coding is understood.
    pub fn body_framing(&self) -> Result<BodyFraming, HttpError> {
        if let Some(codings) = self.header("transfer-encoding") {
            let last = codings.rsplit(',').next().unwrap_or_default().trim();
            if last.eq_ignore_ascii_case("chunked") {
                return Ok(BodyFraming::Chunked);
            }
            return Err(HttpError::MalformedRequest(format!(
                "unsupported Transfer-Encoding: {}",
                codings
            )));
        }
        self.content_length().map(BodyFraming::Length)
    }
}

/// Body delimitation declared by the request head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    Length(usize),
    Chunked,
}

/// Parses a chunk size line (`1a;ext=1\r\n`). Extensions are ignored.
pub fn parse_chunk_size(line: &str) -> Result<usize, HttpError> {
    let size = line
        .trim_end_matches(['\r', '\n'])
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();
    usize::from_str_radix(size, 16)
        .map_err(|_| HttpError::MalformedRequest(format!("invalid chunk size: {:?}", size)))
}

/// Splits `METHOD target HTTP/x.y` into its method token and target.
pub fn parse_request_line(line: &str) -> Result<(String, String), HttpError> {
    let mut parts = line.trim_end_matches(['\r', '\n']).split(' ');
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("");
    let version = parts.next().unwrap_or("");

    if method.is_empty() || target.is_empty() || parts.next().is_some() {
        return Err(HttpError::MalformedRequest(format!(
            "invalid request line: {:?}",
            line.trim_end()
        )));
    }
    if !version.starts_with("HTTP/") {
        return Err(HttpError::MalformedRequest(format!(
            "unsupported protocol version: {:?}",
            version
        )));
    }

    Ok((method.to_string(), target.to_string()))
}

/// Splits a `Name: value` header line. The name is lowercased.
pub fn parse_header_line(line: &str) -> Result<(String, String), HttpError> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    match trimmed.split_once(':') {
        Some((name, value)) if !name.is_empty() && !name.contains(char::is_whitespace) => {
            Ok((name.to_ascii_lowercase(), value.trim().to_string()))
        }
        _ => Err(HttpError::MalformedRequest(format!(
            "invalid header line: {:?}",
            trimmed
        ))),
    }
}

/// Resolves the request target against `http://{host}` and returns only the
/// path component. Query string and fragment are dropped.
///
/// Returns `None` when no URL can be resolved.
pub fn resolve_path(target: &str, host: Option<&str>) -> Option<String> {
    let base = Url::parse(&format!("http://{}", host.unwrap_or("localhost"))).ok()?;
    let url = base.join(target).ok()?;
    Some(url.path().to_string())
}

/// Decodes a POST body as JSON and flattens its top-level members into strings.
///
/// A document that is valid JSON but not an object yields an empty body.
pub fn decode_body(raw: &[u8]) -> Result<Body, HttpError> {
    let document: Value = serde_json::from_slice(raw)
        .map_err(|e| HttpError::InvalidJsonBody(e.to_string()))?;

    let body = match document {
        Value::Object(members) => members
            .iter()
            .map(|(key, value)| (key.clone(), coerce_to_string(value)))
            .collect(),
        _ => Body::new(),
    };
    Ok(body)
}

/// String form of a JSON value, following JavaScript's `value + ''` coercion.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

// Integral floats print without a fractional part, as in JavaScript.
fn number_to_string(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f == 0.0 {
                return "0".to_string();
            }
            if f.fract() == 0.0 && f.abs() < 1e21 {
                return format!("{:.0}", f);
            }
        }
    }
    n.to_string()
}
