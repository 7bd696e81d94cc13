//! Admin User Repository

use super::{RepoError, RepoResult};
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminUser {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
}

/// Emails are stored lowercased
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<AdminUser>> {
    let row = sqlx::query_as::<_, AdminUser>(
        "SELECT id, email, password_hash, created_at FROM admin_user WHERE email = ?",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, email: &str, password_hash: &str) -> RepoResult<AdminUser> {
    let email = email.trim().to_lowercase();
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO admin_user (email, password_hash, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(&email)
    .bind(password_hash)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("User {email} already exists")),
        other => other,
    })?;
    Ok(AdminUser {
        id,
        email,
        password_hash: password_hash.to_string(),
        created_at: now,
    })
}
