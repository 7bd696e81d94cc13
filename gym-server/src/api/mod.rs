//! API routes
//!
//! - [`health`] - health check (public)
//! - [`auth`] - login / logout / seed (public)
//! - [`clients`] - member store (session)
//! - [`attendance`] - check-in resolver, log, summary (session)
//! - [`dashboard`] - overview counters, relay config (session)
//! - [`pages`] - presentation pages (session, redirect to login)

pub mod attendance;
pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod health;
pub mod pages;

use axum::{Router, middleware};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{require_page_session, require_session};
use crate::core::ServerState;

/// Create the combined router
pub fn build_router(state: ServerState) -> Router {
    let admin_api = Router::new()
        .merge(clients::router())
        .merge(attendance::router())
        .merge(dashboard::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let guarded_pages = pages::router(&state.config.web_dir).route_layer(
        middleware::from_fn_with_state(state.clone(), require_page_session),
    );

    let assets = ServeDir::new(&state.config.web_dir).append_index_html_on_directories(true);

    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(admin_api)
        .merge(guarded_pages)
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
