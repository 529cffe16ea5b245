//! Logging middleware
//!
//! Provides per-connection request logging.

use log::{debug, info};
use std::net::SocketAddr;

/// Log an accepted connection
pub fn log_connection(peer: &SocketAddr) {
    debug!("Client connected: {}", peer);
}

/// Log a served request and the status it was answered with
pub fn log_request(peer: &SocketAddr, method: &str, target: &str, status: u16) {
    info!("{} \"{} {}\" {}", peer, method, target, status);
}
