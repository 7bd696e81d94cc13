//! Repository Module
//!
//! Free async functions over a `SqlitePool` (or any executor when they must
//! run inside a caller's transaction).

pub mod member;
pub mod stats;
pub mod user;
pub mod visit;

use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Database(msg) => AppError::internal(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_errors_map_to_http_taxonomy() {
        let err: AppError = RepoError::Duplicate("card_id".into()).into();
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);

        let err: AppError = RepoError::NotFound("Client 9".into()).into();
        assert_eq!(err.http_status(), http::StatusCode::NOT_FOUND);

        let err: AppError = RepoError::Database("disk I/O error".into()).into();
        assert_eq!(err.http_status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal Server Error");
    }
}
