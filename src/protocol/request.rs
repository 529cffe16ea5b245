//! Module `request`
//!
//! Defines the request model handed to route handlers: the HTTP method,
//! the resolved URL path and, for POST, the decoded body.

use std::collections::HashMap;
use std::fmt;

/// Decoded POST body: every top-level JSON value coerced to a string.
pub type Body = HashMap<String, String>;

/// HTTP methods the router can dispatch.
///
/// Any other method token on the wire is answered with 404 before it
/// reaches the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Returns the wire token for this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    /// Parses a method token from the request line. Matching is case-sensitive.
    pub fn from_token(token: &str) -> Option<Method> {
        match token {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully received and routed request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    body: Option<Body>,
}

impl Request {
    /// Builds a GET request. GET handlers never see a body.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    /// Builds a POST request carrying an already decoded body.
    pub fn post(path: impl Into<String>, body: Body) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Returns a body field, or `None` when the field is absent or this is a GET.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|body| body.get(name))
            .map(String::as_str)
    }
}
