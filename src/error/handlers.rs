//! Error handlers
//!
//! Provides error logging and the mapping from request errors to HTTP status codes.

use crate::error::types::HttpError;
use crate::protocol::responses::{
    BAD_REQUEST, INTERNAL_SERVER_ERROR, PAYLOAD_TOO_LARGE,
};
use log::warn;

/// Handle a request-level error
pub fn handle_error(err: &HttpError) {
    warn!("HTTP request error: {}", err);
}

/// Convert error to the HTTP status written back to the caller
pub fn error_to_status(err: &HttpError) -> u16 {
    match err {
        HttpError::MalformedRequest(_) => BAD_REQUEST,
        HttpError::HeadTooLarge(_) => BAD_REQUEST,
        HttpError::BodyTooLarge(_) => PAYLOAD_TOO_LARGE,
        HttpError::InvalidJsonBody(_) => INTERNAL_SERVER_ERROR,
        HttpError::IoError(_) => INTERNAL_SERVER_ERROR,
    }
}
