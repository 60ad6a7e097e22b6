use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a legal hold. A hold transitions to released exactly
/// once and is never reactivated; a new hold is created instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    Active,
    Released,
}

impl std::fmt::Display for HoldStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoldStatus::Active => write!(f, "active"),
            HoldStatus::Released => write!(f, "released"),
        }
    }
}

impl std::str::FromStr for HoldStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(HoldStatus::Active),
            "released" => Ok(HoldStatus::Released),
            _ => Err(format!("Invalid hold status: {}", s)),
        }
    }
}

/// Kind of targeting rule a hold scope expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    /// All documents of one employee.
    Employee,
    /// All documents of employees in one department.
    Department,
    /// All documents of one category.
    Category,
    /// All documents received within a date range.
    DateRange,
    /// Every document in the organization.
    AllOrg,
}

impl std::fmt::Display for ScopeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeType::Employee => write!(f, "employee"),
            ScopeType::Department => write!(f, "department"),
            ScopeType::Category => write!(f, "category"),
            ScopeType::DateRange => write!(f, "date_range"),
            ScopeType::AllOrg => write!(f, "all_org"),
        }
    }
}

impl std::str::FromStr for ScopeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(ScopeType::Employee),
            "department" => Ok(ScopeType::Department),
            "category" => Ok(ScopeType::Category),
            "date_range" => Ok(ScopeType::DateRange),
            "all_org" => Ok(ScopeType::AllOrg),
            _ => Err(format!("Invalid scope type: {}", s)),
        }
    }
}

/// A legal hold: an instruction that suspends deletion for every document
/// matching any of its scopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalHold {
    pub org_id: Uuid,
    pub id: Uuid,
    pub title: String,
    pub reason: Option<String>,
    pub status: HoldStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    /// Set once the initial scope-to-target materialization has fully
    /// completed. NULL on an active hold means the repair pass must finish
    /// the job before the hold may be released.
    pub materialized_at: Option<DateTime<Utc>>,
    pub released_by: Option<Uuid>,
    pub released_at: Option<DateTime<Utc>>,
}

impl LegalHold {
    pub fn is_active(&self) -> bool {
        self.status == HoldStatus::Active
    }
}

/// An abstract targeting rule owned by a hold. Only the fields relevant to
/// scope_type are populated; the rest stay None.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalHoldScope {
    pub org_id: Uuid,
    pub id: Uuid,
    pub hold_id: Uuid,
    pub scope_type: ScopeType,
    pub employee_id: Option<Uuid>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub range_start: Option<DateTime<Utc>>,
    pub range_end: Option<DateTime<Utc>>,
}

/// Scope definition supplied when creating a hold.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLegalHoldScope {
    pub scope_type: ScopeType,
    #[serde(default)]
    pub employee_id: Option<Uuid>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub range_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub range_end: Option<DateTime<Utc>>,
}

/// Input for creating a legal hold.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLegalHold {
    pub title: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub scopes: Vec<CreateLegalHoldScope>,
}

/// A materialized, concrete (hold, document) pairing derived from a scope.
///
/// Targets exist so enforcement checks are O(1) lookups instead of
/// re-evaluating scope predicates per deletion attempt. They are never
/// deleted; a released hold's targets stay as historical evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalHoldTarget {
    pub org_id: Uuid,
    pub hold_id: Uuid,
    pub document_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A hold paired with how many documents it currently targets.
#[derive(Debug, Clone, Serialize)]
pub struct LegalHoldWithCount {
    #[serde(flatten)]
    pub hold: LegalHold,
    pub affected_document_count: i64,
}
