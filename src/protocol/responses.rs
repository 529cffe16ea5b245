//! HTTP response handling
//!
//! Defines status codes, the response value returned by handlers, and its
//! wire serialization.

use log::error;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::HttpError;
use crate::error::handlers::error_to_status;

/// Status codes produced by the control API
pub const OK: u16 = 200;
pub const BAD_REQUEST: u16 = 400;
pub const NOT_FOUND: u16 = 404;
pub const PAYLOAD_TOO_LARGE: u16 = 413;
pub const INTERNAL_SERVER_ERROR: u16 = 500;

const INVALID_JSON_MESSAGE: &str = "Body in not a valid JSON.";

/// What a handler answers with.
///
/// `Json` is written with `Content-Type: application/json` and the serialized
/// value; `Text` with `Content-Type: text/plain` and the string verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Json(u16, Value),
    Text(u16, String),
}

impl Response {
    /// Serializes `data` into a JSON response.
    pub fn json<T: Serialize>(status: u16, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Response::Json(status, value),
            Err(e) => {
                error!("Failed to serialize response body: {}", e);
                Response::Text(INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        }
    }

    pub fn text(status: u16, data: impl Into<String>) -> Self {
        Response::Text(status, data.into())
    }

    pub fn not_found() -> Self {
        Response::text(NOT_FOUND, "Not Found")
    }

    pub fn invalid_json_body() -> Self {
        Response::Json(INTERNAL_SERVER_ERROR, json!({ "error": INVALID_JSON_MESSAGE }))
    }

    /// Maps a request-level error to the response sent back.
    pub fn from_error(err: &HttpError) -> Self {
        match err {
            HttpError::InvalidJsonBody(_) => Response::invalid_json_body(),
            other => {
                let status = error_to_status(other);
                Response::text(status, reason_phrase(status))
            }
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Response::Json(status, _) | Response::Text(status, _) => *status,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Response::Json(..) => "application/json",
            Response::Text(..) => "text/plain",
        }
    }

    /// Response body as sent on the wire.
    pub fn body(&self) -> String {
        match self {
            Response::Json(_, value) => value.to_string(),
            Response::Text(_, text) => text.clone(),
        }
    }

    /// Full HTTP/1.1 response: status line, headers and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = self.body();
        let status = self.status();
        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            reason_phrase(status),
            self.content_type(),
            body.len()
        )
        .into_bytes();
        out.extend_from_slice(body.as_bytes());
        out
    }
}

/// Canonical reason phrase for a status code.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        OK => "OK",
        BAD_REQUEST => "Bad Request",
        NOT_FOUND => "Not Found",
        PAYLOAD_TOO_LARGE => "Payload Too Large",
        INTERNAL_SERVER_ERROR => "Internal Server Error",
        _ => "Unknown",
    }
}
