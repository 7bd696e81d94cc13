//! Server state shared by all handlers

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::SessionKeys;
use crate::core::{Config, Result};
use crate::db::DbService;

/// Cheap to clone: every field is reference counted
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
    pub sessions: Arc<SessionKeys>,
}

impl ServerState {
    /// Build state around an already opened pool
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let sessions = SessionKeys::new(&config.session_secret, config.session_ttl_hours);
        Self {
            config: Arc::new(config),
            pool,
            sessions: Arc::new(sessions),
        }
    }

    /// Open the database (running migrations) and build state
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db = DbService::new(&config.database_path).await?;
        Ok(Self::new(config.clone(), db.pool))
    }
}
