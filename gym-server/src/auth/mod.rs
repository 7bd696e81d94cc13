//! Admin authentication: argon2 passwords, JWT session cookie, route guards

mod middleware;
mod password;
mod session;

pub use middleware::{require_page_session, require_session};
pub use password::{hash_password, verify_password};
pub use session::{
    CurrentUser, SESSION_COOKIE, SessionClaims, SessionKeys, clear_session_cookie,
    session_cookie, session_token,
};
