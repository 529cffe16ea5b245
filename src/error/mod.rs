//! Error handling
//!
//! Defines error types and handling for the control API.

pub mod handlers;
pub mod types;

pub use types::*;
