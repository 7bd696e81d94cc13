//! Attendance API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{AttendanceSummary, CheckInRequest, CheckInSnapshot, VisitLog};

use crate::core::ServerState;
use crate::db::repository::{stats, visit};
use crate::services::attendance;
use crate::utils::{AppResult, ValidJson};

/// Rows shown in the live attendance log
const RECENT_LOGS: i64 = 20;

/// POST /api/attendance - resolve a scanned card into a check-in
pub async fn resolve(
    State(state): State<ServerState>,
    ValidJson(req): ValidJson<CheckInRequest>,
) -> AppResult<Json<CheckInSnapshot>> {
    let snapshot = attendance::resolve_check_in(&state.pool, req.uid.as_deref()).await?;
    Ok(Json(snapshot))
}

#[derive(Serialize)]
pub struct LogsResponse {
    pub success: bool,
    pub logs: Vec<VisitLog>,
}

/// GET /api/attendance - latest visits, newest first
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<LogsResponse>> {
    let logs = visit::find_latest_logs(&state.pool, RECENT_LOGS).await?;
    Ok(Json(LogsResponse {
        success: true,
        logs,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// `asc` for chart order; anything else keeps newest first
    pub order: Option<String>,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: AttendanceSummary,
}

/// GET /api/attendance/summary - distinct visitors per day and per month
pub async fn summary(
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<SummaryResponse>> {
    let mut summary = AttendanceSummary {
        daily: stats::daily_counts(&state.pool, stats::DAILY_WINDOW).await?,
        monthly: stats::monthly_counts(&state.pool, stats::MONTHLY_WINDOW).await?,
    };
    if query.order.as_deref() == Some("asc") {
        summary = summary.into_ascending();
    }
    Ok(Json(SummaryResponse {
        success: true,
        summary,
    }))
}
