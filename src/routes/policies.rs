use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AppState, error::ApiError};
use crate::models::{CreateRetentionPolicy, RetentionPolicy, StateRetentionDefault};

#[derive(Debug, Deserialize)]
pub struct CreatePolicyRequest {
    #[serde(flatten)]
    pub policy: CreateRetentionPolicy,
    /// Actor recorded in the audit trail; omitted for system-origin calls.
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// Create an immutable policy template.
#[tracing::instrument(name = "policies.create", skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(input): Json<CreatePolicyRequest>,
) -> Result<(StatusCode, Json<RetentionPolicy>), ApiError> {
    let policy = state
        .services
        .policies
        .create_policy(org_id, input.policy, input.created_by)
        .await?;
    Ok((StatusCode::CREATED, Json(policy)))
}

/// Get a policy template by id.
#[tracing::instrument(name = "policies.get", skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path((org_id, policy_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RetentionPolicy>, ApiError> {
    let policy = state.services.policies.get_policy(org_id, policy_id).await?;
    Ok(Json(policy))
}

#[derive(Debug, Deserialize)]
pub struct StateDefaultRequest {
    pub state_code: String,
    pub effective_date: NaiveDate,
    pub policy_id: Uuid,
}

/// Map a (state, effective date) to a policy template.
#[tracing::instrument(name = "policies.set_state_default", skip(state, input))]
pub async fn set_state_default(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(input): Json<StateDefaultRequest>,
) -> Result<(StatusCode, Json<StateRetentionDefault>), ApiError> {
    let default = state
        .services
        .policies
        .set_state_default(org_id, &input.state_code, input.effective_date, input.policy_id)
        .await?;
    Ok((StatusCode::CREATED, Json(default)))
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub state_code: String,
    pub category: String,
    pub as_of: NaiveDate,
}

/// Resolve the effective policy for a hypothetical document.
#[tracing::instrument(name = "policies.resolve", skip(state))]
pub async fn resolve(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<RetentionPolicy>, ApiError> {
    let policy = state
        .services
        .policies
        .resolve(org_id, &query.state_code, &query.category, query.as_of)
        .await?;
    Ok(Json(policy))
}

#[derive(Debug, Serialize)]
pub struct SeedDefaultsResponse {
    pub seeded: usize,
}

/// Seed the stock per-state defaults and system fallback for a tenant.
#[tracing::instrument(name = "policies.seed_defaults", skip(state))]
pub async fn seed_defaults(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<SeedDefaultsResponse>, ApiError> {
    let seeded = state.services.policies.seed_state_defaults(org_id).await?;
    Ok(Json(SeedDefaultsResponse { seeded }))
}
