pub mod api;
pub mod client;
pub mod error;
pub mod extension;
pub mod middleware;
pub mod protocol;
pub mod server;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{Client, ClientDisconnected, ClientHandle, RoutingServer, ServerHandle};
pub use extension::{Extension, ExtensionMeta, ExtensionState, HostExtension};
pub use server::{ConfigLoader, HttpServer, UserConfig, Verbosity};
