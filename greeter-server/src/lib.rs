//! HTTP surface of the visitor greeter.
//!
//! The binary (`greeter`) wires configuration and logging around
//! [`routes::create_router`]; tests drive the router directly.

pub mod client_ip;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
