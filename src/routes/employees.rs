use axum::{
    Json,
    extract::{Path, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{AppState, error::ApiError};
use crate::models::{CreateEmployee, Employee};

/// Register (or redeliver) an employee record.
#[tracing::instrument(name = "employees.register", skip(state, input))]
pub async fn register(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(input): Json<CreateEmployee>,
) -> Result<Json<Employee>, ApiError> {
    let employee = state.services.documents.register_employee(org_id, input).await?;
    Ok(Json(employee))
}

#[derive(Debug, Deserialize)]
pub struct TerminationRequest {
    pub terminated_at: NaiveDate,
}

/// Record an employment termination and start the affected retention clocks.
#[tracing::instrument(name = "employees.terminate", skip(state, input))]
pub async fn terminate(
    State(state): State<AppState>,
    Path((org_id, employee_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<TerminationRequest>,
) -> Result<Json<Employee>, ApiError> {
    let employee = state
        .services
        .documents
        .on_employment_terminated(org_id, employee_id, input.terminated_at)
        .await?;
    Ok(Json(employee))
}
