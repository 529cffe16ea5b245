//! Configuration management for the control API
//!
//! `UserConfig` is immutable for the lifetime of one running HTTP server;
//! a reload swaps it out and restarts the listener.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment, File, FileFormat};
use log::{info, warn};
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::Deserialize;

/// Name the host knows this extension by
pub const EXTENSION_NAME: &str = "SwitchServersByAPI";

/// Prefix for environment overrides, e.g. `SWITCH_API_PORT=4000`
pub const ENV_PREFIX: &str = "SWITCH_API";

/// Environment variable selecting where the config file is looked up
pub const MODE_ENV: &str = "SWITCH_API_MODE";

pub const DEFAULT_PORT: u16 = 3000;

/// Verbosity of operator-facing messages, ordered from quietest to loudest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Verbosity {
    Silent = 0,
    #[default]
    Normal = 1,
    Verbose = 2,
}

impl Verbosity {
    pub fn from_level(level: u64) -> Option<Verbosity> {
        match level {
            0 => Some(Verbosity::Silent),
            1 => Some(Verbosity::Normal),
            2 => Some(Verbosity::Verbose),
            _ => None,
        }
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(level) = trimmed.parse::<u64>() {
            return Verbosity::from_level(level)
                .ok_or_else(|| format!("unknown verbosity level {}", level));
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "SILENT" => Ok(Verbosity::Silent),
            "NORMAL" => Ok(Verbosity::Normal),
            "VERBOSE" => Ok(Verbosity::Verbose),
            other => Err(format!("unknown verbosity {:?}", other)),
        }
    }
}

// Accepts the numeric levels of existing config.json files as well as names.
impl<'de> Deserialize<'de> for Verbosity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VerbosityVisitor;

        impl Visitor<'_> for VerbosityVisitor {
            type Value = Verbosity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a verbosity level 0-2 or one of SILENT, NORMAL, VERBOSE")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Verbosity, E> {
                Verbosity::from_level(v)
                    .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Verbosity, E> {
                u64::try_from(v)
                    .ok()
                    .and_then(Verbosity::from_level)
                    .ok_or_else(|| E::invalid_value(Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Verbosity, E> {
                v.parse()
                    .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(VerbosityVisitor)
    }
}

/// Per-method switches for one path. `true` means the route is not registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointToggles {
    #[serde(rename = "GET", alias = "get")]
    pub get: bool,
    #[serde(rename = "POST", alias = "post")]
    pub post: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisabledEndpoints {
    #[serde(rename = "/")]
    pub root: EndpointToggles,
}

/// Operator configuration, as found in `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub port: u16,
    pub verbosity: Verbosity,
    #[serde(rename = "disabledEndpoints", alias = "disabledendpoints")]
    pub disabled_endpoints: DisabledEndpoints,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            verbosity: Verbosity::Normal,
            disabled_endpoints: DisabledEndpoints::default(),
        }
    }
}

impl UserConfig {
    pub fn new(port: u16, verbosity: Verbosity) -> Self {
        Self {
            port,
            verbosity,
            disabled_endpoints: DisabledEndpoints::default(),
        }
    }

    pub fn with_disabled_endpoints(mut self, disabled: EndpointToggles) -> Self {
        self.disabled_endpoints.root = disabled;
        self
    }

    /// Validation for values loaded from disk or the environment
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }
        Ok(())
    }
}

/// Where the extension runs, which decides where its config file lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Loaded by the host from `extensions/<NAME>_<VERSION>/`
    Embedded,
    /// Development and tests: `./config.json`
    Standalone,
}

impl RunMode {
    pub fn config_path(self) -> PathBuf {
        match self {
            RunMode::Embedded => Path::new("extensions")
                .join(format!("{}_{}", EXTENSION_NAME, env!("CARGO_PKG_VERSION")))
                .join("config.json"),
            RunMode::Standalone => PathBuf::from("config.json"),
        }
    }

    /// Reads the mode from `SWITCH_API_MODE`, if set to a known value.
    pub fn detect() -> Option<RunMode> {
        let raw = std::env::var(MODE_ENV).ok()?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "embedded" => Some(RunMode::Embedded),
            "standalone" => Some(RunMode::Standalone),
            other => {
                warn!("Ignoring unknown {} value {:?}", MODE_ENV, other);
                None
            }
        }
    }
}

/// Loads `UserConfig`: defaults, then the first existing config file, then
/// `SWITCH_API_*` environment overrides.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    candidates: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Uses the run mode from the environment, or tries the embedded path
    /// first and the standalone path second.
    pub fn new() -> Self {
        let candidates = match RunMode::detect() {
            Some(mode) => vec![mode.config_path()],
            None => vec![
                RunMode::Embedded.config_path(),
                RunMode::Standalone.config_path(),
            ],
        };
        Self { candidates }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec![path.into()],
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that exists on disk.
    pub fn resolve(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|path| path.is_file())
    }

    pub fn load(&self) -> Result<UserConfig, ConfigError> {
        let mut builder = Config::builder();

        match self.resolve() {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                builder = builder.add_source(File::from(path).format(FileFormat::Json));
            }
            None => warn!(
                "No config file found (tried {:?}), using defaults",
                self.candidates
            ),
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        let config: UserConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
