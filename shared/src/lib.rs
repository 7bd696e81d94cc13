//! Shared types for the front desk workspace
//!
//! Types used by both `gym-server` and `card-bridge`: domain models,
//! the relay wire envelope, the unified error type and time helpers.

pub mod error;
pub mod models;
pub mod relay;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{MembershipType, Member, Visit};
pub use relay::{CardTap, CardUid, RelayMessage};
