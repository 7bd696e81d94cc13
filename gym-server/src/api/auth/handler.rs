//! Auth API Handlers

use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::{clear_session_cookie, hash_password, session_cookie, verify_password};
use crate::core::ServerState;
use crate::db::repository::{RepoError, user};
use crate::utils::{AppError, AppResult, ErrorCode, ValidJson};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /api/login - verify credentials and set the session cookie
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    ValidJson(req): ValidJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let user = user::find_by_email(&state.pool, &req.email).await?;

    let verified = match &user {
        Some(u) => {
            let password = req.password.clone();
            let hash = u.password_hash.clone();
            tokio::task::spawn_blocking(move || verify_password(&password, &hash))
                .await
                .map_err(|e| AppError::internal(format!("Password check failed: {e}")))?
        }
        None => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        tracing::warn!(target: "security", email = %req.email, "Login failed");
        return Err(AppError::invalid_credentials());
    };

    let token = state.sessions.issue(user.id, &user.email)?;
    tracing::info!(target: "security", user_id = user.id, email = %user.email, "Login succeeded");

    let cookie = session_cookie(token, state.sessions.max_age_secs());
    Ok((
        jar.add(cookie),
        Json(MessageResponse {
            message: "Logged in",
        }),
    ))
}

/// POST /api/logout - expire the session cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    tracing::info!(target: "security", "Logout");
    (
        jar.add(clear_session_cookie()),
        Json(MessageResponse {
            message: "Logged out",
        }),
    )
}

/// GET /api/seed - create the configured admin account if it is missing
pub async fn seed(State(state): State<ServerState>) -> AppResult<Json<MessageResponse>> {
    if !state.config.seed_enabled() {
        return Err(AppError::not_found("Route"));
    }
    let email = state.config.admin_email.clone();
    let password = state.config.admin_password.clone().ok_or_else(|| {
        AppError::with_message(ErrorCode::ConfigError, "ADMIN_PASSWORD is not configured")
    })?;

    if user::find_by_email(&state.pool, &email).await?.is_some() {
        return Ok(Json(MessageResponse {
            message: "User already exists",
        }));
    }

    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

    match user::create(&state.pool, &email, &hash).await {
        Ok(user) => {
            tracing::info!(target: "security", user_id = user.id, email = %user.email, "Seeded admin user");
            Ok(Json(MessageResponse {
                message: "Seeded admin user",
            }))
        }
        Err(RepoError::Duplicate(_)) => Ok(Json(MessageResponse {
            message: "User already exists",
        })),
        Err(e) => Err(e.into()),
    }
}
