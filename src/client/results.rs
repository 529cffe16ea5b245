//! Client result types
//!
//! Snapshot structures returned by registry listings.

use serde::Serialize;

use crate::client::handle::Client;

/// One row of the client listing in `GET /` and in 404 diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSummary {
    pub uuid: String,
    pub name: String,
    #[serde(rename = "serverName")]
    pub server_name: String,
}

impl ClientSummary {
    /// Reads the client's live state through its handle.
    pub fn of(client: &dyn Client) -> Self {
        Self {
            uuid: client.identifier().to_string(),
            name: client.display_name(),
            server_name: client.current_server().name().to_string(),
        }
    }
}
