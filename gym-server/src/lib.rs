//! Gym Server - fitness club front desk
//!
//! Member records, NFC attendance and the reporting dashboard, served over
//! HTTP to the admin browser. The card bridge process links this crate for
//! the database layer and the visit state machine.
//!
//! ```text
//! gym-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # argon2, JWT session cookie, guards
//! ├── api/           # HTTP routes and handlers
//! ├── services/      # attendance transitions
//! ├── db/            # SQLite pool, migrations, repositories
//! └── utils/         # logger, extractors
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use db::DbService;
pub use utils::logger::{init_logger, init_logger_with_file};
pub use utils::{AppError, AppResult};
