//! Logging utilities
//!
//! Provides logging setup and the operator-facing reporting capability.
//!
//! Two channels exist side by side: the `log` facade carries diagnostics
//! filtered by `RUST_LOG`, while a [`Reporter`] carries the extension's
//! operator messages, gated by the configured [`Verbosity`].

use std::sync::Arc;

use env_logger::Env;
use log::info;

use crate::server::config::Verbosity;

/// Setup logging for the process. `RUST_LOG` overrides the default `info` filter.
pub fn setup_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Sink for operator-facing messages.
pub trait Reporter: Send + Sync {
    fn report(&self, level: Verbosity, message: &str, submessage: Option<&str>);
}

/// Writes reports through the `log` facade, prefixed with the extension name.
#[derive(Debug, Clone)]
pub struct LogReporter {
    name: String,
}

impl LogReporter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Reporter for LogReporter {
    fn report(&self, _level: Verbosity, message: &str, submessage: Option<&str>) {
        info!("[Extension] {}: {}", self.name, message);
        if let Some(sub) = submessage {
            info!("{}", sub);
        }
    }
}

/// A reporter bound to a verbosity threshold.
#[derive(Clone)]
pub struct ExtensionLog {
    verbosity: Verbosity,
    reporter: Arc<dyn Reporter>,
}

impl ExtensionLog {
    pub fn new(verbosity: Verbosity, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            verbosity,
            reporter,
        }
    }

    /// Forwards the message unless the configured verbosity is below `level`.
    pub fn log(&self, level: Verbosity, message: &str, submessage: Option<&str>) {
        if self.verbosity < level {
            return;
        }
        self.reporter.report(level, message, submessage);
    }

    pub fn normal(&self, message: &str) {
        self.log(Verbosity::Normal, message, None);
    }

    pub fn verbose(&self, message: &str) {
        self.log(Verbosity::Verbose, message, None);
    }
}
