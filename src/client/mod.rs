//! Client management system
//!
//! Host-owned client and routing-server handles, and the registry that
//! tracks them for the control API.

pub mod handle;
pub mod registry;
pub mod results;

pub use handle::{
    Client, ClientDisconnected, ClientHandle, RoutingServer, ServerHandle, ServerMap,
};
pub use registry::{Registry, SharedRegistry, lock_registry};
pub use results::ClientSummary;
