//! Extension lifecycle
//!
//! Ties the registry, the configuration and the HTTP server together and
//! implements the host's lifecycle contract. The registry lives behind a
//! shared handle, so restarting the server (reload) or swapping the whole
//! state (load/unload) never leaves handlers looking at a stale copy.

pub mod meta;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, warn};

use crate::api::register_routes;
use crate::client::{ClientDisconnected, ClientHandle, Registry, SharedRegistry, lock_registry};
use crate::error::ExtensionError;
use crate::server::{ConfigLoader, HttpServer, UserConfig, Verbosity};
use crate::utils::{ExtensionLog, Reporter};

pub use meta::ExtensionMeta;
pub use state::{ExtensionState, HostExtension};

/// Address the API server binds unless told otherwise
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

pub struct Extension {
    meta: ExtensionMeta,
    config: UserConfig,
    loader: ConfigLoader,
    registry: SharedRegistry,
    reporter: Arc<dyn Reporter>,
    server: Option<HttpServer>,
    bind_host: String,
}

impl Extension {
    /// Creates an extension with an empty registry. The API server is not
    /// started until [`Extension::start_api_server`] is called.
    pub fn new(config: UserConfig, loader: ConfigLoader, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            meta: ExtensionMeta::from_package(),
            config,
            loader,
            registry: Registry::new().into_shared(),
            reporter,
            server: None,
            bind_host: DEFAULT_BIND_HOST.to_string(),
        }
    }

    pub fn with_bind_host(mut self, host: impl Into<String>) -> Self {
        self.bind_host = host.into();
        self
    }

    pub fn meta(&self) -> &ExtensionMeta {
        &self.meta
    }

    pub fn config(&self) -> &UserConfig {
        &self.config
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().and_then(HttpServer::local_addr)
    }

    fn log(&self) -> ExtensionLog {
        ExtensionLog::new(self.config.verbosity, Arc::clone(&self.reporter))
    }

    /// Registers the enabled routes on a fresh server and starts listening.
    /// A server that is already running is stopped first.
    pub async fn start_api_server(&mut self) -> Result<SocketAddr, ExtensionError> {
        if self.server.is_some() {
            self.stop_quietly().await;
        }

        let log = self.log();
        let mut server = HttpServer::new();
        register_routes(&server, &self.config, &self.registry, &log);
        let addr = server.listen(self.config.port, &self.bind_host).await?;
        self.server = Some(server);

        let project = (!self.meta.github_url.is_empty()).then(|| {
            format!(
                "Check out the project on GitHub for updates: {}",
                self.meta.github_url
            )
        });
        log.log(
            Verbosity::Normal,
            &format!("The API server is now live at http://127.0.0.1:{}", addr.port()),
            project.as_deref(),
        );
        Ok(addr)
    }

    /// Stops the API server. Without a running server this does nothing.
    ///
    /// A failure to close is reported and returned; the server is considered
    /// gone either way.
    pub async fn stop_api_server(&mut self) -> Result<(), ExtensionError> {
        let Some(mut server) = self.server.take() else {
            return Ok(());
        };

        let log = self.log();
        log.normal("The API server is now shutting down.");
        let result = server.close().await;
        if let Err(e) = &result {
            log.normal(&format!("Failed to stop the API server. {}", e));
        }
        log.normal("The API server has been shut down. Goodbye!");
        result.map_err(ExtensionError::from)
    }

    async fn stop_quietly(&mut self) {
        if let Err(e) = self.stop_api_server().await {
            warn!("Continuing after failed API server shutdown: {}", e);
        }
    }

    /// Restarts the API server with `config`. The registry is untouched.
    pub async fn reconfigure(&mut self, config: UserConfig) -> Result<SocketAddr, ExtensionError> {
        self.stop_quietly().await;
        self.config = config;
        self.start_api_server().await
    }
}

impl HostExtension for Extension {
    fn load(&mut self, state: ExtensionState) {
        *lock_registry(&self.registry) = state.into_registry();
    }

    fn unload(&mut self) -> ExtensionState {
        ExtensionState::new(std::mem::take(&mut *lock_registry(&self.registry)))
    }

    /// Stops the server, re-reads configuration and starts again. When the
    /// configuration cannot be loaded the previous one stays in effect, the
    /// server is restarted with it, and the load error is returned.
    async fn reload(&mut self) -> Result<(), ExtensionError> {
        self.stop_quietly().await;

        let loaded = match self.loader.load() {
            Ok(config) => {
                self.config = config;
                Ok(())
            }
            Err(e) => {
                error!("Failed to reload configuration, keeping the current one: {}", e);
                Err(ExtensionError::Config(e))
            }
        };

        self.start_api_server().await?;
        loaded
    }

    fn on_client_connected(&self, client: ClientHandle) {
        let identifier = client.identifier().to_string();
        {
            let mut registry = lock_registry(&self.registry);
            registry.upsert_client(client);
            registry.refresh_destinations();
        }
        self.log()
            .verbose(&format!("Client with UUID \"{}\" has connected.", identifier));
    }

    fn on_client_disconnected(&self, event: &ClientDisconnected) -> bool {
        {
            let mut registry = lock_registry(&self.registry);
            registry.remove_client(event.identifier());
            registry.refresh_destinations();
        }
        self.log().verbose(&format!(
            "Client with UUID \"{}\" has disconnected.",
            event.identifier()
        ));
        false
    }
}
