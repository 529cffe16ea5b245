//! In-memory host doubles and a recording reporter for unit tests.

use std::sync::{Arc, Mutex};

use crate::client::handle::{Client, ClientHandle, RoutingServer, ServerHandle, ServerMap};
use crate::error::ReassignmentError;
use crate::server::Verbosity;
use crate::utils::Reporter;

pub struct MockServer {
    name: String,
}

impl MockServer {
    pub fn handle(name: &str) -> ServerHandle {
        Arc::new(Self {
            name: name.to_string(),
        })
    }
}

impl RoutingServer for MockServer {
    fn name(&self) -> &str {
        &self.name
    }
}

pub struct MockClient {
    uuid: String,
    name: String,
    current: Mutex<ServerHandle>,
    servers: ServerMap,
    failure: Option<ReassignmentError>,
    requests: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new(
        uuid: &str,
        name: &str,
        current: &ServerHandle,
        servers: &[&ServerHandle],
    ) -> Arc<Self> {
        Arc::new(Self::build(uuid, name, current, servers, None))
    }

    pub fn handle(
        uuid: &str,
        name: &str,
        current: &ServerHandle,
        servers: &[&ServerHandle],
    ) -> ClientHandle {
        Self::new(uuid, name, current, servers)
    }

    /// A client whose every reassignment is rejected by the host.
    pub fn failing(
        uuid: &str,
        name: &str,
        current: &ServerHandle,
        servers: &[&ServerHandle],
    ) -> Arc<Self> {
        let failure = ReassignmentError::Rejected("server is full".into());
        Arc::new(Self::build(uuid, name, current, servers, Some(failure)))
    }

    fn build(
        uuid: &str,
        name: &str,
        current: &ServerHandle,
        servers: &[&ServerHandle],
        failure: Option<ReassignmentError>,
    ) -> Self {
        Self {
            uuid: uuid.to_string(),
            name: name.to_string(),
            current: Mutex::new(Arc::clone(current)),
            servers: servers
                .iter()
                .map(|server| (server.name().to_string(), Arc::clone(server)))
                .collect(),
            failure,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Names of every destination a reassignment was requested for.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn move_to(&self, destination: &ServerHandle) {
        self.request_reassignment(destination).unwrap();
    }
}

impl Client for MockClient {
    fn identifier(&self) -> &str {
        &self.uuid
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn current_server(&self) -> ServerHandle {
        Arc::clone(&self.current.lock().unwrap())
    }

    fn servers(&self) -> ServerMap {
        self.servers.clone()
    }

    fn request_reassignment(&self, destination: &ServerHandle) -> Result<(), ReassignmentError> {
        self.requests
            .lock()
            .unwrap()
            .push(destination.name().to_string());
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        *self.current.lock().unwrap() = Arc::clone(destination);
        Ok(())
    }
}

/// Keeps every reported message (and submessage) in order.
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, _level: Verbosity, message: &str, submessage: Option<&str>) {
        let mut lines = self.lines.lock().unwrap();
        lines.push(message.to_string());
        if let Some(sub) = submessage {
            lines.push(sub.to_string());
        }
    }
}
