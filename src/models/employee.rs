use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registry entry for an employee, fed by the employee-record collaborator.
///
/// The engine keeps only the fields that scope materialization and policy
/// resolution need; the surrounding product owns the full employee record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub org_id: Uuid,
    pub id: Uuid,
    pub department: Option<String>,
    /// Two-letter work-location state code (e.g. "FL").
    pub work_state: String,
    /// Termination date, NULL while employed.
    pub terminated_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Input for registering an employee. The id is assigned by the collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployee {
    pub id: Uuid,
    pub department: Option<String>,
    pub work_state: String,
}
