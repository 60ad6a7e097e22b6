use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    db::DbError,
    services::{DocumentError, LegalHoldError, PolicyError, ScheduleError},
};

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Conflict(String),
    /// A hold exists but its targets are not all applied; callers and
    /// operators must be able to tell this apart from an ordinary conflict.
    MaterializationIncomplete(String),
    Validation(String),
    BadRequest(String),
    Database(DbError),
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            DbError::Validation(msg) => ApiError::Validation(msg),
            _ => ApiError::Database(err),
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PolicyError::NoPolicyResolvable { .. } => ApiError::Conflict(err.to_string()),
            PolicyError::Validation(msg) => ApiError::Validation(msg),
            PolicyError::Database(db_err) => db_err.into(),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::ScheduleNotFound(_)
            | ScheduleError::DocumentNotFound(_)
            | ScheduleError::EmployeeNotFound(_) => ApiError::NotFound(err.to_string()),
            ScheduleError::ConflictRetriesExhausted(_) => ApiError::Conflict(err.to_string()),
            ScheduleError::Validation(msg) => ApiError::Validation(msg),
            ScheduleError::Policy(policy_err) => policy_err.into(),
            ScheduleError::Database(db_err) => db_err.into(),
        }
    }
}

impl From<LegalHoldError> for ApiError {
    fn from(err: LegalHoldError) -> Self {
        match err {
            LegalHoldError::NotFound(_) => ApiError::NotFound(err.to_string()),
            LegalHoldError::AlreadyReleased(_) => ApiError::Conflict(err.to_string()),
            LegalHoldError::MaterializationIncomplete(_) => {
                ApiError::MaterializationIncomplete(err.to_string())
            }
            LegalHoldError::Validation(msg) => ApiError::Validation(msg),
            LegalHoldError::Schedule(schedule_err) => schedule_err.into(),
            LegalHoldError::Database(db_err) => db_err.into(),
        }
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound(_) | DocumentError::EmployeeNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            DocumentError::Validation(msg) => ApiError::Validation(msg),
            DocumentError::Policy(policy_err) => policy_err.into(),
            DocumentError::Schedule(schedule_err) => schedule_err.into(),
            DocumentError::LegalHold(hold_err) => hold_err.into(),
            DocumentError::Database(db_err) => db_err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::MaterializationIncomplete(msg) => {
                tracing::error!(error = %msg, "Hold materialization incomplete");
                (StatusCode::CONFLICT, "materialization_incomplete", msg)
            }
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
