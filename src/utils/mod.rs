//! Utility functions
//!
//! Logging setup and operator reporting.

pub mod logging;

pub use logging::{ExtensionLog, LogReporter, Reporter, setup_logging};
