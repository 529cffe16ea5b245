//! SwitchServersByAPI - Entry Point
//!
//! Runs the control API on its own, without a proxy host feeding it clients.
//! Useful for checking configuration and endpoint toggles.

use std::sync::Arc;

use log::{error, info};

use switch_servers_api::server::config::EXTENSION_NAME;
use switch_servers_api::utils::{LogReporter, setup_logging};
use switch_servers_api::{ConfigLoader, Extension};

#[tokio::main]
async fn main() {
    setup_logging();

    let loader = ConfigLoader::new();
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Launching {} on port {}...", EXTENSION_NAME, config.port);
    let mut extension = Extension::new(config, loader, Arc::new(LogReporter::new(EXTENSION_NAME)));
    if let Err(e) = extension.start_api_server().await {
        error!("Failed to start the API server: {}", e);
        std::process::exit(1);
    }

    shutdown_signal().await;

    if let Err(e) = extension.stop_api_server().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
