//! Dashboard API Handlers

use axum::{Json, extract::State};
use serde::Serialize;
use shared::models::DashboardOverview;

use crate::core::ServerState;
use crate::db::repository::stats;
use crate::utils::AppResult;

/// GET /api/dashboard/overview - member counters
pub async fn overview(State(state): State<ServerState>) -> AppResult<Json<DashboardOverview>> {
    let overview = stats::overview(&state.pool, shared::util::today()).await?;
    Ok(Json(overview))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    pub relay_url: String,
}

/// GET /api/config/relay - where pages subscribe to card taps
pub async fn relay_config(State(state): State<ServerState>) -> Json<RelayConfig> {
    Json(RelayConfig {
        relay_url: state.config.relay_url.clone(),
    })
}
