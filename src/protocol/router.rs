//! Module `router`
//!
//! Maps `METHOD path` keys to handlers and turns a parsed request head plus
//! its raw body into a response. Holds no sockets; the HTTP server owns a
//! router and feeds it requests.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::error::handlers::handle_error;
use crate::protocol::parser::{RequestHead, decode_body, resolve_path};
use crate::protocol::request::{Method, Request};
use crate::protocol::responses::Response;

/// A route handler. Handlers run synchronously once the request is complete.
pub type Handler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

#[derive(Clone, Default)]
pub struct Router {
    handlers: HashMap<String, Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the lookup key: method token, one space, exact path.
    pub fn route_key(method: &str, path: &str) -> String {
        format!("{} {}", method, path)
    }

    /// Registers `handler` for one (method, path) pair, replacing any earlier one.
    pub fn register<F>(&mut self, method: Method, path: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.handlers
            .insert(Self::route_key(method.as_str(), path), Arc::new(handler));
    }

    pub fn get<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.register(Method::Get, path, handler);
    }

    pub fn post<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.register(Method::Post, path, handler);
    }

    pub fn lookup(&self, method: Method, path: &str) -> Option<Handler> {
        self.handlers
            .get(&Self::route_key(method.as_str(), path))
            .cloned()
    }

    pub fn contains(&self, method: Method, path: &str) -> bool {
        self.handlers
            .contains_key(&Self::route_key(method.as_str(), path))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Matches a request head to its handler without touching the body.
    ///
    /// Unresolvable URLs, methods other than GET/POST and unregistered keys
    /// all yield `None`, which the server answers with `404 Not Found`.
    pub fn route(&self, head: &RequestHead) -> Option<Route> {
        let Some(path) = resolve_path(&head.target, head.header("host")) else {
            debug!("Unresolvable request target {:?}", head.target);
            return None;
        };
        let method = Method::from_token(&head.method)?;
        let handler = self.lookup(method, &path)?;
        Some(Route {
            method,
            path,
            handler,
        })
    }
}

/// A request head matched to a registered handler.
#[derive(Clone)]
pub struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

impl Route {
    /// Runs the handler. POST bodies are decoded first; a body that is not
    /// valid JSON short-circuits with 500 and the handler is not called.
    pub fn respond(&self, body: &[u8]) -> Response {
        let request = match self.method {
            Method::Get => Request::get(self.path.clone()),
            Method::Post => match decode_body(body) {
                Ok(decoded) => Request::post(self.path.clone(), decoded),
                Err(e) => {
                    handle_error(&e);
                    return Response::from_error(&e);
                }
            },
        };
        (self.handler)(&request)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<&String> = self.handlers.keys().collect();
        routes.sort();
        f.debug_struct("Router").field("routes", &routes).finish()
    }
}
