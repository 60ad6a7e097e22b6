use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{AppState, error::ApiError};
use crate::{
    models::{ComplianceState, CreateDocument},
    services::RegisteredDocument,
};

/// Register a document and put it under retention.
#[tracing::instrument(name = "documents.register", skip(state, input))]
pub async fn register(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(input): Json<CreateDocument>,
) -> Result<(StatusCode, Json<RegisteredDocument>), ApiError> {
    let registered = state.services.documents.register_document(org_id, input).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

/// Current compliance posture of a document.
#[tracing::instrument(name = "documents.compliance", skip(state))]
pub async fn compliance(
    State(state): State<AppState>,
    Path((org_id, document_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ComplianceState>, ApiError> {
    // 404 on an unknown document rather than an unknown schedule.
    state.services.documents.get_document(org_id, document_id).await?;
    let compliance = state
        .services
        .schedules
        .compliance_state(org_id, document_id)
        .await?;
    Ok(Json(compliance))
}

/// Withdraw a document's retention schedule.
#[tracing::instrument(name = "documents.cancel_schedule", skip(state))]
pub async fn cancel_schedule(
    State(state): State<AppState>,
    Path((org_id, document_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state.services.schedules.cancel(org_id, document_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Recompute a document's retention clock from its stored policy.
#[tracing::instrument(name = "documents.recompute", skip(state))]
pub async fn recompute(
    State(state): State<AppState>,
    Path((org_id, document_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<crate::models::RetentionSchedule>, ApiError> {
    let schedule = state.services.schedules.recompute(org_id, document_id).await?;
    Ok(Json(schedule))
}
