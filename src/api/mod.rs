//! Control API
//!
//! The two routes operators use to inspect clients and switch their servers.

pub mod handlers;
pub mod payloads;

pub use handlers::{ROOT_PATH, list_state, register_routes, switch_server};
