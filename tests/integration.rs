use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use switch_servers_api::error::ReassignmentError;
use switch_servers_api::protocol::Response;
use switch_servers_api::utils::Reporter;
use switch_servers_api::{
    Client, ClientDisconnected, ClientHandle, ConfigLoader, Extension, HostExtension, HttpServer,
    RoutingServer, ServerHandle, UserConfig, Verbosity,
};

struct Destination(String);

impl RoutingServer for Destination {
    fn name(&self) -> &str {
        &self.0
    }
}

fn destination(name: &str) -> ServerHandle {
    Arc::new(Destination(name.to_string()))
}

struct Session {
    uuid: String,
    name: String,
    current: Mutex<ServerHandle>,
    servers: IndexMap<String, ServerHandle>,
    reject: bool,
    requested: Mutex<Vec<String>>,
}

impl Session {
    fn new(uuid: &str, current: &ServerHandle, servers: &[&ServerHandle]) -> Arc<Self> {
        Arc::new(Self {
            uuid: uuid.to_string(),
            name: format!("player-{}", uuid),
            current: Mutex::new(Arc::clone(current)),
            servers: servers
                .iter()
                .map(|s| (s.name().to_string(), Arc::clone(s)))
                .collect(),
            reject: false,
            requested: Mutex::new(Vec::new()),
        })
    }

    fn rejecting(uuid: &str, current: &ServerHandle, servers: &[&ServerHandle]) -> Arc<Self> {
        let mut session = Arc::into_inner(Self::new(uuid, current, servers)).unwrap();
        session.reject = true;
        Arc::new(session)
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Client for Session {
    fn identifier(&self) -> &str {
        &self.uuid
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn current_server(&self) -> ServerHandle {
        Arc::clone(&self.current.lock().unwrap())
    }

    fn servers(&self) -> IndexMap<String, ServerHandle> {
        self.servers.clone()
    }

    fn request_reassignment(&self, target: &ServerHandle) -> Result<(), ReassignmentError> {
        self.requested.lock().unwrap().push(target.name().to_string());
        if self.reject {
            return Err(ReassignmentError::Rejected("target refused".into()));
        }
        *self.current.lock().unwrap() = Arc::clone(target);
        Ok(())
    }
}

struct Quiet;

impl Reporter for Quiet {
    fn report(&self, _level: Verbosity, _message: &str, _submessage: Option<&str>) {}
}

fn extension(config: UserConfig) -> Extension {
    let loader = ConfigLoader::with_path("/nonexistent/switch-servers-api/config.json");
    Extension::new(config, loader, Arc::new(Quiet)).with_bind_host("127.0.0.1")
}

async fn started(config: UserConfig) -> (Extension, SocketAddr) {
    let mut ext = extension(config);
    let addr = ext.start_api_server().await.unwrap();
    (ext, addr)
}

struct Reply {
    status: u16,
    content_type: String,
    body: String,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn send(addr: SocketAddr, raw: &[u8]) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    let mut text = String::new();
    stream.read_to_string(&mut text).await.unwrap();

    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let status = head.split(' ').nth(1).unwrap().parse().unwrap();
    let content_type = head
        .lines()
        .find_map(|line| line.strip_prefix("Content-Type: "))
        .unwrap_or_default()
        .to_string();
    Reply {
        status,
        content_type,
        body: body.to_string(),
    }
}

async fn get(addr: SocketAddr, path: &str) -> Reply {
    let raw = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path);
    send(addr, raw.as_bytes()).await
}

async fn post(addr: SocketAddr, path: &str, body: &str) -> Reply {
    let raw = format!(
        "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    );
    send(addr, raw.as_bytes()).await
}

#[tokio::test]
async fn get_root_on_empty_registry_is_stable() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;

    let first = get(addr, "/").await;
    assert_eq!(first.status, 200);
    assert!(first.content_type.starts_with("application/json"));
    assert_eq!(first.json(), json!({ "servers": [], "clients": [] }));

    let second = get(addr, "/").await;
    assert_eq!(second.body, first.body);

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn unregistered_routes_return_not_found() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;

    let reply = get(addr, "/missing").await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body, "Not Found");

    let reply = send(addr, b"PUT / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body, "Not Found");

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn unregistered_routes_ignore_body_framing() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;

    let reply = send(
        addr,
        b"GET /missing HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2000000\r\n\r\n",
    )
    .await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body, "Not Found");

    let reply = send(
        addr,
        b"GET /missing HTTP/1.1\r\nHost: localhost\r\nContent-Length: abc\r\n\r\n",
    )
    .await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body, "Not Found");

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn chunked_switch_request_is_decoded() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;
    let a = destination("A");
    let b = destination("B");
    let session = Session::new("u1", &a, &[&a, &b]);
    ext.on_client_connected(session.clone());

    let reply = send(
        addr,
        b"POST / HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\r\n\
          13\r\n{\"clientUUID\":\"u1\",\r\n\
          11\r\n\"serverName\":\"B\"}\r\n\
          0\r\n\r\n",
    )
    .await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "ok");
    assert_eq!(session.requested(), vec!["B"]);

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn query_string_does_not_affect_routing() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;
    let reply = get(addr, "/?verbose=1").await;
    assert_eq!(reply.status, 200);
    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn switch_round_trip_reflects_live_client() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;
    let a = destination("A");
    let b = destination("B");
    let session = Session::new("u1", &a, &[&a, &b]);
    ext.on_client_connected(session.clone());

    let listed = get(addr, "/").await.json();
    assert_eq!(listed["servers"], json!(["A", "B"]));
    assert_eq!(
        listed["clients"],
        json!([{ "uuid": "u1", "name": "player-u1", "serverName": "A" }])
    );

    let reply = post(addr, "/", r#"{"clientUUID":"u1","serverName":"B"}"#).await;
    assert_eq!(reply.status, 200);
    assert!(reply.content_type.starts_with("text/plain"));
    assert_eq!(reply.body, "ok");
    assert_eq!(session.requested(), vec!["B"]);

    let listed = get(addr, "/").await.json();
    assert_eq!(listed["clients"][0]["serverName"], "B");

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn switch_unknown_client_lists_available_clients() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;
    let a = destination("A");
    let session = Session::new("u1", &a, &[&a]);
    ext.on_client_connected(session.clone());

    let reply = post(addr, "/", r#"{"clientUUID":"zzz","serverName":"A"}"#).await;
    assert_eq!(reply.status, 404);
    assert_eq!(
        reply.json(),
        json!({
            "error": "Client with such UUID does not exist.",
            "clientUUID": "zzz",
            "availableClients": [{ "uuid": "u1", "name": "player-u1", "serverName": "A" }]
        })
    );
    assert!(session.requested().is_empty());

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn switch_validates_against_client_own_servers() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;
    let a = destination("A");
    let b = destination("B");
    let c = destination("C");
    let restricted = Session::new("u1", &a, &[&a, &b]);
    ext.on_client_connected(restricted.clone());
    ext.on_client_connected(Session::new("u2", &c, &[&c]));

    assert_eq!(get(addr, "/").await.json()["servers"], json!(["A", "B", "C"]));

    let reply = post(addr, "/", r#"{"clientUUID":"u1","serverName":"C"}"#).await;
    assert_eq!(reply.status, 404);
    assert_eq!(
        reply.json(),
        json!({
            "error": "Server does not exist.",
            "serverName": "C",
            "availableServers": ["A", "B"]
        })
    );
    assert!(restricted.requested().is_empty());

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn rejected_reassignment_reports_failure() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;
    let a = destination("A");
    let b = destination("B");
    let session = Session::rejecting("u1", &a, &[&a, &b]);
    ext.on_client_connected(session.clone());

    let reply = post(addr, "/", r#"{"clientUUID":"u1","serverName":"B"}"#).await;
    assert_eq!(reply.status, 500);
    assert_eq!(
        reply.json(),
        json!({
            "error": "Failed to switch server.",
            "clientUUID": "u1",
            "clientName": "player-u1",
            "fromServer": "A",
            "toServer": "B"
        })
    );
    assert_eq!(session.requested(), vec!["B"]);

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn malformed_json_never_reaches_handler() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;
    let a = destination("A");
    let b = destination("B");
    let session = Session::new("u1", &a, &[&a, &b]);
    ext.on_client_connected(session.clone());

    let reply = post(addr, "/", r#"{"clientUUID":"u1","serverName":"B""#).await;
    assert_eq!(reply.status, 500);
    assert_eq!(reply.body, r#"{"error":"Body in not a valid JSON."}"#);
    assert!(session.requested().is_empty());

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn handlers_receive_string_coerced_values() {
    let mut server = HttpServer::new();
    server.post("/echo", |request| {
        Response::json(200, &request.body().cloned().unwrap_or_default())
    });
    let addr = server.listen(0, "127.0.0.1").await.unwrap();

    let reply = post(addr, "/echo", r#"{"n":42,"f":1.5,"b":true,"s":"x","z":null}"#).await;
    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.json(),
        json!({ "n": "42", "f": "1.5", "b": "true", "s": "x", "z": "null" })
    );

    server.close().await.unwrap();
}

#[tokio::test]
async fn disabled_get_endpoint_is_not_found() {
    let config = UserConfig::new(0, Verbosity::Silent).with_disabled_endpoints(
        switch_servers_api::server::config::EndpointToggles {
            get: true,
            post: false,
        },
    );
    let (mut ext, addr) = started(config).await;

    let reply = get(addr, "/").await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body, "Not Found");

    let reply = post(addr, "/", r#"{"clientUUID":"nobody"}"#).await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.json()["availableClients"], json!([]));

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn disconnect_forgets_client_and_its_destinations() {
    let (mut ext, addr) = started(UserConfig::new(0, Verbosity::Silent)).await;
    let a = destination("A");
    let b = destination("B");
    let first: ClientHandle = Session::new("u1", &a, &[&a]);
    let second: ClientHandle = Session::new("u2", &b, &[&a, &b]);
    ext.on_client_connected(first);
    ext.on_client_connected(second.clone());

    assert!(!ext.on_client_disconnected(&ClientDisconnected::new(second)));

    let listed = get(addr, "/").await.json();
    assert_eq!(listed["servers"], json!(["A"]));
    assert_eq!(listed["clients"][0]["uuid"], "u1");
    assert_eq!(listed["clients"].as_array().map(Vec::len), Some(1));

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn state_survives_unload_and_load_into_new_instance() {
    let (mut old, _) = started(UserConfig::new(0, Verbosity::Silent)).await;
    let a = destination("A");
    old.on_client_connected(Session::new("u1", &a, &[&a]));
    old.stop_api_server().await.unwrap();
    let state = old.unload();

    let mut resumed = extension(UserConfig::new(0, Verbosity::Silent));
    resumed.load(state);
    let addr = resumed.start_api_server().await.unwrap();

    let listed = get(addr, "/").await.json();
    assert_eq!(listed["servers"], json!(["A"]));
    assert_eq!(listed["clients"][0]["uuid"], "u1");

    resumed.stop_api_server().await.unwrap();
}

fn temp_config(name: &str, contents: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "switch-servers-api-it-{}-{}",
        std::process::id(),
        name
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, contents).unwrap();
    path
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::test]
async fn reload_applies_new_configuration_and_keeps_clients() {
    let port = free_port();
    let path = temp_config(
        "reload-ok",
        &format!(r#"{{"port": {}, "disabledEndpoints": {{"/": {{"GET": false, "POST": true}}}}}}"#, port),
    );
    let mut ext = Extension::new(
        UserConfig::new(0, Verbosity::Silent),
        ConfigLoader::with_path(&path),
        Arc::new(Quiet),
    )
    .with_bind_host("127.0.0.1");
    ext.start_api_server().await.unwrap();
    let a = destination("A");
    ext.on_client_connected(Session::new("u1", &a, &[&a]));

    ext.reload().await.unwrap();
    let addr = ext.local_addr().unwrap();
    assert_eq!(addr.port(), port);

    assert_eq!(get(addr, "/").await.json()["clients"][0]["uuid"], "u1");
    let reply = post(addr, "/", r#"{"clientUUID":"u1","serverName":"A"}"#).await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body, "Not Found");

    ext.stop_api_server().await.unwrap();
}

#[tokio::test]
async fn reload_with_broken_configuration_keeps_previous_one() {
    let path = temp_config("reload-broken", "{ not json");
    let mut ext = Extension::new(
        UserConfig::new(0, Verbosity::Silent),
        ConfigLoader::with_path(&path),
        Arc::new(Quiet),
    )
    .with_bind_host("127.0.0.1");
    ext.start_api_server().await.unwrap();

    assert!(ext.reload().await.is_err());
    assert_eq!(ext.config().port, 0);
    let addr = ext.local_addr().unwrap();
    assert_eq!(get(addr, "/").await.status, 200);

    ext.stop_api_server().await.unwrap();
}
