//! Dashboard API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/dashboard/overview", get(handler::overview))
        .route("/api/config/relay", get(handler::relay_config))
}
