//! Module `state`
//!
//! The value handed between an extension instance and the host across a
//! suspend/resume cycle, plus the lifecycle contract the host drives.

use std::future::Future;

use crate::client::{ClientDisconnected, ClientHandle, Registry};
use crate::error::ExtensionError;

/// Everything that must survive the extension being unloaded and loaded again.
#[derive(Debug, Default, Clone)]
pub struct ExtensionState {
    registry: Registry,
}

impl ExtensionState {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_registry(self) -> Registry {
        self.registry
    }
}

/// Lifecycle contract between the host and an extension.
///
/// The host calls these at its own discretion; event callbacks may arrive
/// from any thread.
pub trait HostExtension {
    /// Replaces the extension's state wholesale, e.g. when resuming.
    fn load(&mut self, state: ExtensionState);

    /// Takes the extension's state out, leaving it empty, e.g. when suspending.
    fn unload(&mut self) -> ExtensionState;

    /// Re-reads configuration and restarts the API server. State is kept.
    fn reload(&mut self) -> impl Future<Output = Result<(), ExtensionError>> + Send;

    /// A client finished connecting.
    fn on_client_connected(&self, client: ClientHandle);

    /// A client's connection went away. Returns whether the event was consumed.
    fn on_client_disconnected(&self, event: &ClientDisconnected) -> bool;
}
