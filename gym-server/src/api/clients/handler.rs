//! Client API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::models::member::{check_period, normalize_card_id};
use shared::models::{Member, MemberCreate, MemberUpdate};

use crate::core::ServerState;
use crate::db::repository::{RepoError, member};
use crate::utils::{AppError, AppResult, ErrorCode, ValidJson};

#[derive(Serialize)]
pub struct ClientListResponse {
    pub success: bool,
    pub clients: Vec<Member>,
}

#[derive(Serialize)]
pub struct ClientResponse {
    pub success: bool,
    pub client: Member,
}

impl From<Member> for ClientResponse {
    fn from(client: Member) -> Self {
        Self {
            success: true,
            client,
        }
    }
}

fn member_error(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::CardAlreadyAssigned, msg),
        RepoError::NotFound(_) => AppError::new(ErrorCode::MemberNotFound),
        other => other.into(),
    }
}

/// GET /api/client - all clients in creation order
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ClientListResponse>> {
    let clients = member::find_all(&state.pool).await?;
    Ok(Json(ClientListResponse {
        success: true,
        clients,
    }))
}

/// GET /api/client/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ClientResponse>> {
    let client = member::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
    Ok(Json(client.into()))
}

/// POST /api/client - intake form
pub async fn create(
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<MemberCreate>,
) -> AppResult<Json<ClientResponse>> {
    let payload = payload.normalized()?;
    let client = member::create(&state.pool, payload)
        .await
        .map_err(member_error)?;
    tracing::info!(member_id = client.id, card_id = ?client.card_id, "Client created");
    Ok(Json(client.into()))
}

/// PUT /api/client/{id} - renewal, freeze toggle, card reassignment
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    ValidJson(mut patch): ValidJson<MemberUpdate>,
) -> AppResult<Json<ClientResponse>> {
    if let Some(raw) = patch.card_id.take() {
        // blank clears the card
        patch.card_id = Some(normalize_card_id(Some(&raw))?.unwrap_or_default());
    }

    let existing = member::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
    if let Some(expiration) = patch.expiration_date {
        check_period(existing.start_date, expiration)?;
    }

    let client = member::update(&state.pool, id, patch)
        .await
        .map_err(member_error)?;
    tracing::info!(member_id = id, is_frozen = client.is_frozen, "Client updated");
    Ok(Json(client.into()))
}
