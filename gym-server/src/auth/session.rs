//! Session tokens and the `auth` cookie
//!
//! The cookie carries an HS256 JWT. Pages and admin APIs only need to know
//! that it verifies; the claims identify the admin for logging.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::{AppError, AppResult};

/// Cookie name shared with the login page
pub const SESSION_COOKIE: &str = "auth";

/// JWT claims for an admin session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Admin user id
    pub sub: String,
    pub email: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated admin extracted from the session cookie
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
}

/// Signing material and lifetime for session tokens
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: chrono::Duration::hours(ttl_hours),
        }
    }

    /// Cookie `Max-Age` in seconds
    pub fn max_age_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Create a session token for an admin
    pub fn issue(&self, user_id: i64, email: &str) -> AppResult<String> {
        let now = chrono::Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + self.ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::internal(format!("Failed to sign session token: {e}")))
    }

    /// `None` for a forged, malformed or expired token
    pub fn verify(&self, token: &str) -> Option<CurrentUser> {
        let data =
            jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &Validation::default())
                .map_err(|e| tracing::debug!("Session validation failed: {e}"))
                .ok()?;
        Some(CurrentUser {
            id: data.claims.sub.parse().ok()?,
            email: data.claims.email,
        })
    }
}

fn base_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie establishing a session
pub fn session_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    let mut cookie = base_cookie(token);
    cookie.set_max_age(time::Duration::seconds(max_age_secs));
    cookie
}

/// Cookie expiring the session immediately, whether or not the request had one
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = base_cookie(String::new());
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

/// Session token carried by the request's cookies
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn issued_token_verifies() {
        let keys = SessionKeys::new("secret", 12);
        let token = keys.issue(7, "admin@gym.local").unwrap();
        let user = keys.verify(&token).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.email, "admin@gym.local");
        assert_eq!(keys.max_age_secs(), 12 * 3600);
    }

    #[test]
    fn foreign_or_garbage_tokens_are_rejected() {
        let keys = SessionKeys::new("secret", 12);
        let other = SessionKeys::new("other-secret", 12);
        let token = other.issue(7, "admin@gym.local").unwrap();
        assert!(keys.verify(&token).is_none());
        // the value the old login used to set
        assert!(keys.verify("authenticated").is_none());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = SessionKeys::new("secret", -1);
        let token = keys.issue(7, "admin@gym.local").unwrap();
        assert!(keys.verify(&token).is_none());
    }

    #[test]
    fn token_is_read_from_the_cookie_jar() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; auth=abc.def.ghi; x=1"));
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(session_token(&jar), Some("abc.def.ghi"));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("auth="));
        assert_eq!(session_token(&CookieJar::from_headers(&headers)), None);
        assert_eq!(session_token(&CookieJar::new()), None);
    }

    #[test]
    fn cookie_attributes() {
        let set = session_cookie("tok".into(), 60).to_string();
        assert!(set.starts_with("auth=tok;"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Path=/"));
        assert!(set.contains("SameSite=Lax"));
        assert!(set.contains("Max-Age=60"));

        let cleared = clear_session_cookie().to_string();
        assert!(cleared.starts_with("auth=;"));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn jar_emits_set_cookie_headers() {
        use axum::response::IntoResponse;

        let jar = CookieJar::new().add(session_cookie("tok".into(), 60));
        let response = (jar, "ok").into_response();
        let set: Vec<_> = response.headers().get_all(axum::http::header::SET_COOKIE).iter().collect();
        assert_eq!(set.len(), 1);
        assert!(set[0].to_str().unwrap().starts_with("auth=tok;"));
    }
}
