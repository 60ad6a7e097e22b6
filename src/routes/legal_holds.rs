use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AppState, error::ApiError};
use crate::models::{CreateLegalHold, LegalHold, LegalHoldWithCount};

#[derive(Debug, Deserialize)]
pub struct CreateHoldRequest {
    #[serde(flatten)]
    pub hold: CreateLegalHold,
    pub created_by: Uuid,
}

/// Create a legal hold and materialize its scopes.
#[tracing::instrument(name = "legal_holds.create", skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(input): Json<CreateHoldRequest>,
) -> Result<(StatusCode, Json<LegalHold>), ApiError> {
    let hold = state
        .services
        .legal_holds
        .create_hold(org_id, input.hold, input.created_by)
        .await?;
    Ok((StatusCode::CREATED, Json(hold)))
}

#[derive(Debug, Serialize)]
pub struct HoldListResponse {
    pub data: Vec<LegalHoldWithCount>,
}

/// List holds with their affected document counts.
#[tracing::instrument(name = "legal_holds.list", skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<HoldListResponse>, ApiError> {
    let data = state.services.legal_holds.list_holds(org_id).await?;
    Ok(Json(HoldListResponse { data }))
}

/// Get a hold by id.
#[tracing::instrument(name = "legal_holds.get", skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path((org_id, hold_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<LegalHold>, ApiError> {
    let hold = state.services.legal_holds.get_hold(org_id, hold_id).await?;
    Ok(Json(hold))
}

#[derive(Debug, Deserialize)]
pub struct ReleaseHoldRequest {
    pub released_by: Uuid,
}

/// Release a hold and resume schedules no other hold protects.
#[tracing::instrument(name = "legal_holds.release", skip(state, input))]
pub async fn release(
    State(state): State<AppState>,
    Path((org_id, hold_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<ReleaseHoldRequest>,
) -> Result<Json<LegalHold>, ApiError> {
    let hold = state
        .services
        .legal_holds
        .release_hold(org_id, hold_id, input.released_by)
        .await?;
    Ok(Json(hold))
}

/// Rerun materialization for a hold whose creation was interrupted.
#[tracing::instrument(name = "legal_holds.repair", skip(state))]
pub async fn repair(
    State(state): State<AppState>,
    Path((org_id, hold_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<LegalHold>, ApiError> {
    let hold = state.services.legal_holds.repair_hold(org_id, hold_id).await?;
    Ok(Json(hold))
}
