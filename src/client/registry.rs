//! Client registry
//!
//! Tracks the clients the host reported as connected and the destinations
//! reachable from them. The destination map is a derived cache: it is rebuilt
//! from the clients' own server maps on every membership change and never
//! patched in place.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;

use crate::client::handle::{ClientHandle, ServerHandle};
use crate::client::results::ClientSummary;

/// Registry shared between host callbacks and HTTP handlers.
pub type SharedRegistry = Arc<Mutex<Registry>>;

/// Locks the shared registry. A poisoned lock still yields the data; every
/// mutation is a single map operation, so no half-applied state can be seen.
pub fn lock_registry(registry: &SharedRegistry) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clients by identifier and destinations by name, both in insertion order.
#[derive(Clone, Default)]
pub struct Registry {
    clients: IndexMap<String, ClientHandle>,
    destinations: IndexMap<String, ServerHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Inserts or replaces the entry for the client's identifier. A replaced
    /// entry keeps its position in the listing.
    pub fn upsert_client(&mut self, client: ClientHandle) -> Option<ClientHandle> {
        self.clients.insert(client.identifier().to_string(), client)
    }

    /// Removes the client if present; absent identifiers are ignored.
    pub fn remove_client(&mut self, identifier: &str) -> Option<ClientHandle> {
        self.clients.shift_remove(identifier)
    }

    pub fn client(&self, identifier: &str) -> Option<&ClientHandle> {
        self.clients.get(identifier)
    }

    pub fn contains_client(&self, identifier: &str) -> bool {
        self.clients.contains_key(identifier)
    }

    pub fn destination(&self, name: &str) -> Option<&ServerHandle> {
        self.destinations.get(name)
    }

    /// Replaces the whole destination map with one entry per distinct name
    /// in `servers`. A later handle with a repeated name wins.
    pub fn rebuild_destinations<I>(&mut self, servers: I)
    where
        I: IntoIterator<Item = ServerHandle>,
    {
        let mut destinations = IndexMap::new();
        for server in servers {
            destinations.insert(server.name().to_string(), server);
        }
        self.destinations = destinations;
    }

    /// Rebuilds destinations from the servers of every tracked client.
    pub fn refresh_destinations(&mut self) {
        let servers: Vec<ServerHandle> = self
            .clients
            .values()
            .flat_map(|client| client.servers().into_values())
            .collect();
        self.rebuild_destinations(servers);
    }

    pub fn list_clients(&self) -> Vec<ClientSummary> {
        self.clients
            .values()
            .map(|client| ClientSummary::of(client.as_ref()))
            .collect()
    }

    pub fn list_destination_names(&self) -> Vec<String> {
        self.destinations.keys().cloned().collect()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty() && self.destinations.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("clients", &self.clients.keys().collect::<Vec<_>>())
            .field("destinations", &self.destinations.keys().collect::<Vec<_>>())
            .finish()
    }
}
