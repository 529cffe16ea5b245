//! Package metadata the host displays for this extension.

use crate::server::config::EXTENSION_NAME;

pub const RELOAD_NAME: &str = "reload_switch_servers_by_api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMeta {
    pub name: &'static str,
    pub version: String,
    pub author: &'static str,
    pub github_url: &'static str,
    pub reloadable: bool,
    pub reload_name: &'static str,
}

impl ExtensionMeta {
    /// Metadata taken from the crate manifest.
    pub fn from_package() -> Self {
        Self {
            name: EXTENSION_NAME,
            version: format!("v{}", env!("CARGO_PKG_VERSION")),
            author: env!("CARGO_PKG_AUTHORS"),
            github_url: env!("CARGO_PKG_REPOSITORY").trim_end_matches(".git"),
            reloadable: true,
            reload_name: RELOAD_NAME,
        }
    }
}
