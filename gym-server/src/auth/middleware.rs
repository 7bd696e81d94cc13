//! Session guards for admin APIs and pages

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use shared::AppError;

use super::session::{CurrentUser, session_token};
use crate::core::ServerState;

fn current_user(state: &ServerState, request: &Request) -> Option<CurrentUser> {
    let jar = CookieJar::from_headers(request.headers());
    state.sessions.verify(session_token(&jar)?)
}

/// API guard: 401 JSON error without a valid session
pub async fn require_session(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = current_user(&state, &request).ok_or_else(AppError::not_authenticated)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Page guard: redirect to the login page without a valid session
pub async fn require_page_session(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    match current_user(&state, &request) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => Redirect::to("/").into_response(),
    }
}
