//! HTTP protocol implementation
//!
//! Handles request parsing, routing, and response generation.

pub mod parser;
pub mod request;
pub mod responses;
pub mod router;

pub use parser::{BodyFraming, RequestHead};
pub use request::{Body, Method, Request};
pub use responses::Response;
pub use router::{Handler, Route, Router};
