//! Utilities: logging setup, request extractors

pub mod json;
pub mod logger;

pub use json::ValidJson;
pub use shared::{AppError, AppResult, ErrorCategory, ErrorCode};
