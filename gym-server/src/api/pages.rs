//! Session-guarded presentation pages
//!
//! `/dashboard`, `/attendance` and `/client` map to `<WEB_DIR>/<name>.html`.
//! Everything else under `WEB_DIR` (the login page at `/`, scripts, styles)
//! is served publicly by the router fallback.

use axum::{Router, routing::get_service};
use std::path::Path;
use tower_http::services::ServeFile;

use crate::core::ServerState;

const PAGES: [&str; 3] = ["dashboard", "attendance", "client"];

pub fn router(web_dir: &str) -> Router<ServerState> {
    PAGES.into_iter().fold(Router::new(), |router, page| {
        let file = Path::new(web_dir).join(format!("{page}.html"));
        router.route(&format!("/{page}"), get_service(ServeFile::new(file)))
    })
}
