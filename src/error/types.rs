//! Error types
//!
//! Defines domain-specific error types for each module of the control API.

use std::fmt;
use std::io;

/// Errors raised while reading and decoding an inbound HTTP request
#[derive(Debug)]
pub enum HttpError {
    IoError(io::Error),
    MalformedRequest(String),
    HeadTooLarge(usize),
    BodyTooLarge(usize),
    InvalidJsonBody(String),
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::IoError(e) => write!(f, "I/O error: {}", e),
            HttpError::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            HttpError::HeadTooLarge(limit) => write!(f, "Request head exceeds {} bytes", limit),
            HttpError::BodyTooLarge(len) => {
                write!(f, "Request body of {} bytes exceeds limit", len)
            }
            HttpError::InvalidJsonBody(msg) => write!(f, "Invalid JSON body: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

impl From<io::Error> for HttpError {
    fn from(error: io::Error) -> Self {
        HttpError::IoError(error)
    }
}

/// Listener lifecycle errors
#[derive(Debug)]
pub enum ServerError {
    Bind(String, io::Error),
    IoError(io::Error),
    AcceptLoop(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Bind(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
            ServerError::AcceptLoop(msg) => write!(f, "Accept loop terminated abnormally: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::IoError(error)
    }
}

/// Failure reported by the host when a client cannot be moved to another server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassignmentError {
    Rejected(String),
    Unavailable(String),
}

impl fmt::Display for ReassignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReassignmentError::Rejected(msg) => write!(f, "Reassignment rejected: {}", msg),
            ReassignmentError::Unavailable(msg) => {
                write!(f, "Destination unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for ReassignmentError {}

/// Errors surfaced by the extension lifecycle (start, stop, reload)
#[derive(Debug)]
pub enum ExtensionError {
    Config(config::ConfigError),
    Server(ServerError),
}

impl fmt::Display for ExtensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionError::Config(e) => write!(f, "Configuration error: {}", e),
            ExtensionError::Server(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for ExtensionError {}

impl From<config::ConfigError> for ExtensionError {
    fn from(error: config::ConfigError) -> Self {
        ExtensionError::Config(error)
    }
}

impl From<ServerError> for ExtensionError {
    fn from(error: ServerError) -> Self {
        ExtensionError::Server(error)
    }
}
