//! Domain services on top of the repositories

pub mod attendance;

pub use attendance::{TapApplied, apply_tap, resolve_check_in};
