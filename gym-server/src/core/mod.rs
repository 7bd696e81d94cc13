//! Core module: configuration, shared state, HTTP server
//!
//! - [`Config`] - server configuration
//! - [`ServerState`] - state handed to every handler
//! - [`Server`] - HTTP listener
//! - [`ServerError`] - startup errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
