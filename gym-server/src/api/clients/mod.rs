//! Client (member) API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/client", get(handler::list).post(handler::create))
        .route("/api/client/{id}", get(handler::get_by_id).put(handler::update))
}
