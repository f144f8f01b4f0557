//! graph-auth
//!
//! User registration and login over a unique-email user store, issuing
//! HS256 tokens. The binary in `main.rs` wires these pieces to an HTTP server.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;

pub use api::create_router;
pub use config::Config;
