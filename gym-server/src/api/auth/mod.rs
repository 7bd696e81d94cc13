//! Login / logout / seed API (public)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/login", post(handler::login))
        .route("/api/logout", post(handler::logout))
        .route("/api/seed", get(handler::seed))
}
