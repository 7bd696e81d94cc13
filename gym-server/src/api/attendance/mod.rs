//! Attendance API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/attendance", get(handler::list).post(handler::resolve))
        .route("/api/attendance/summary", get(handler::summary))
}
