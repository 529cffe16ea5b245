//! Module `handle`
//!
//! Host-side objects the control API observes. The host owns clients and
//! routing servers; this crate only keeps shared handles to them and calls
//! back through these traits.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ReassignmentError;

/// A destination a client can be routed to.
pub trait RoutingServer: Send + Sync {
    /// Unique name, used as the external identifier in API payloads.
    fn name(&self) -> &str;
}

pub type ServerHandle = Arc<dyn RoutingServer>;

/// Destinations reachable from one client, keyed by name in host order.
pub type ServerMap = IndexMap<String, ServerHandle>;

/// One connected end-user session.
pub trait Client: Send + Sync {
    /// Unique identifier (the session UUID).
    fn identifier(&self) -> &str;

    /// Display name, computed by the host on every call.
    fn display_name(&self) -> String;

    /// The destination the client is routed to right now.
    fn current_server(&self) -> ServerHandle;

    /// Destinations this particular client may be moved to.
    fn servers(&self) -> ServerMap;

    /// Asks the host to move the client. Either fully succeeds or fails
    /// without partial effect.
    fn request_reassignment(&self, destination: &ServerHandle) -> Result<(), ReassignmentError>;
}

pub type ClientHandle = Arc<dyn Client>;

/// Host event: a client's connection went away.
#[derive(Clone)]
pub struct ClientDisconnected {
    client: ClientHandle,
}

impl ClientDisconnected {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    pub fn identifier(&self) -> &str {
        self.client.identifier()
    }
}

impl fmt::Debug for ClientDisconnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientDisconnected")
            .field("client", &self.client.identifier())
            .finish()
    }
}
