//! JSON bodies produced by the control API.
//!
//! Fields that were absent from the request are left out of the output
//! rather than written as `null`.

use serde::Serialize;

use crate::client::ClientSummary;

pub const CLIENT_NOT_FOUND: &str = "Client with such UUID does not exist.";
pub const SERVER_NOT_FOUND: &str = "Server does not exist.";
pub const SWITCH_FAILED: &str = "Failed to switch server.";

/// `GET /`
#[derive(Debug, Serialize)]
pub struct StateView {
    pub servers: Vec<String>,
    pub clients: Vec<ClientSummary>,
}

#[derive(Debug, Serialize)]
pub struct ClientNotFound<'a> {
    pub error: &'static str,
    #[serde(rename = "clientUUID", skip_serializing_if = "Option::is_none")]
    pub client_uuid: Option<&'a str>,
    #[serde(rename = "availableClients")]
    pub available_clients: Vec<ClientSummary>,
}

#[derive(Debug, Serialize)]
pub struct ServerNotFound<'a> {
    pub error: &'static str,
    #[serde(rename = "serverName", skip_serializing_if = "Option::is_none")]
    pub server_name: Option<&'a str>,
    #[serde(rename = "availableServers")]
    pub available_servers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SwitchFailed<'a> {
    pub error: &'static str,
    #[serde(rename = "clientUUID")]
    pub client_uuid: &'a str,
    #[serde(rename = "clientName")]
    pub client_name: String,
    #[serde(rename = "fromServer")]
    pub from_server: String,
    #[serde(rename = "toServer")]
    pub to_server: &'a str,
}
