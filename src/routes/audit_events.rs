use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use uuid::Uuid;

use super::{AppState, error::ApiError};
use crate::models::{AuditEvent, AuditEventQuery};

/// Paginated list of audit events.
#[derive(Debug, Serialize)]
pub struct AuditEventListResponse {
    pub data: Vec<AuditEvent>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
}

/// Query the audit ledger, newest first, cursor-restartable.
#[tracing::instrument(name = "audit_events.list", skip(state, query))]
pub async fn list(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<AuditEventQuery>,
) -> Result<Json<AuditEventListResponse>, ApiError> {
    if let Some(ref dir) = query.direction
        && dir != "forward"
        && dir != "backward"
    {
        return Err(ApiError::BadRequest(format!(
            "Invalid direction '{}': must be 'forward' or 'backward'",
            dir
        )));
    }

    let result = state.services.audit_events.list(org_id, query).await?;

    Ok(Json(AuditEventListResponse {
        data: result.items,
        has_more: result.has_more,
        next_cursor: result.cursors.next.map(|c| c.encode()),
        prev_cursor: result.cursors.prev.map(|c| c.encode()),
    }))
}
