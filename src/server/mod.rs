//! Server core functionality
//!
//! This module contains the minimal HTTP server and the configuration it is
//! started with.

pub mod config;
pub mod core;

pub use self::config::{ConfigLoader, UserConfig, Verbosity};
pub use self::core::HttpServer;
