//! Control API handlers
//!
//! `GET /` lists destinations and clients; `POST /` moves one client to
//! another of its destinations. Each handler does its registry work in a
//! single critical section and releases the lock before calling into the
//! host.

use std::sync::Arc;

use log::warn;

use crate::api::payloads::{
    CLIENT_NOT_FOUND, ClientNotFound, SERVER_NOT_FOUND, SWITCH_FAILED, ServerNotFound,
    StateView, SwitchFailed,
};
use crate::client::{Registry, SharedRegistry, lock_registry};
use crate::protocol::Request;
use crate::protocol::Response;
use crate::protocol::responses::{INTERNAL_SERVER_ERROR, NOT_FOUND, OK};
use crate::server::{HttpServer, UserConfig};
use crate::utils::ExtensionLog;

pub const ROOT_PATH: &str = "/";

/// Registers the routes the configuration leaves enabled. A disabled route is
/// simply not registered, so requests to it get the router's plain 404.
pub fn register_routes(
    server: &HttpServer,
    config: &UserConfig,
    registry: &SharedRegistry,
    log: &ExtensionLog,
) {
    let disabled = config.disabled_endpoints.root;

    if !disabled.get {
        let registry = Arc::clone(registry);
        server.get(ROOT_PATH, move |_| list_state(&lock_registry(&registry)));
    }

    if !disabled.post {
        let registry = Arc::clone(registry);
        let log = log.clone();
        server.post(ROOT_PATH, move |request| switch_server(&registry, request, &log));
    }
}

/// `GET /`: destination names and client summaries.
pub fn list_state(registry: &Registry) -> Response {
    Response::json(
        OK,
        &StateView {
            servers: registry.list_destination_names(),
            clients: registry.list_clients(),
        },
    )
}

/// `POST /` with `clientUUID` and `serverName`.
pub fn switch_server(registry: &SharedRegistry, request: &Request, log: &ExtensionLog) -> Response {
    let client_uuid = request.field("clientUUID");
    let server_name = request.field("serverName");

    let client = {
        let registry = lock_registry(registry);
        match client_uuid.and_then(|uuid| registry.client(uuid)) {
            Some(client) => Arc::clone(client),
            None => {
                return Response::json(
                    NOT_FOUND,
                    &ClientNotFound {
                        error: CLIENT_NOT_FOUND,
                        client_uuid,
                        available_clients: registry.list_clients(),
                    },
                );
            }
        }
    };

    // Validated against this client's own destinations, not the global cache.
    let servers = client.servers();
    let Some((target_name, destination)) =
        server_name.and_then(|name| servers.get_key_value(name))
    else {
        return Response::json(
            NOT_FOUND,
            &ServerNotFound {
                error: SERVER_NOT_FOUND,
                server_name,
                available_servers: servers.keys().cloned().collect(),
            },
        );
    };

    let from_server = client.current_server().name().to_string();
    if let Err(e) = client.request_reassignment(destination) {
        warn!(
            "Failed to switch client {} from {} to {}: {}",
            client.identifier(),
            from_server,
            target_name,
            e
        );
        return Response::json(
            INTERNAL_SERVER_ERROR,
            &SwitchFailed {
                error: SWITCH_FAILED,
                client_uuid: client.identifier(),
                client_name: client.display_name(),
                from_server,
                to_server: target_name,
            },
        );
    }

    log.verbose(&format!(
        "Client with UUID \"{}\" has been switched from \"{}\" to \"{}\".",
        client.identifier(),
        from_server,
        target_name
    ));
    Response::text(OK, "ok")
}
