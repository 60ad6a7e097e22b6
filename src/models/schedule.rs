use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{LegalHold, RetentionStartEvent};

/// Lifecycle state of a retention schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Deletion will proceed once delete_eligible_at passes.
    Scheduled,
    /// At least one active legal hold target references the document.
    PausedLegalHold,
    /// Content deleted and tombstoned. Terminal.
    Deleted,
    /// Schedule withdrawn (document removed through another channel). Terminal.
    Canceled,
}

impl ScheduleStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScheduleStatus::Deleted | ScheduleStatus::Canceled)
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleStatus::Scheduled => write!(f, "scheduled"),
            ScheduleStatus::PausedLegalHold => write!(f, "paused_legal_hold"),
            ScheduleStatus::Deleted => write!(f, "deleted"),
            ScheduleStatus::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for ScheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(ScheduleStatus::Scheduled),
            "paused_legal_hold" => Ok(ScheduleStatus::PausedLegalHold),
            "deleted" => Ok(ScheduleStatus::Deleted),
            "canceled" => Ok(ScheduleStatus::Canceled),
            _ => Err(format!("Invalid schedule status: {}", s)),
        }
    }
}

/// One deletion schedule per document (1:1).
///
/// The stored deadline never changes when holds come and go: holds suspend
/// enforcement, they do not recompute the clock. The version column guards
/// conditional writes under concurrent workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSchedule {
    pub org_id: Uuid,
    pub id: Uuid,
    pub document_id: Uuid,
    /// The policy resolved at scheduling time. Kept even if the org later
    /// repoints its policy references (grandfathering).
    pub policy_id: Uuid,
    pub start_event: RetentionStartEvent,
    /// NULL until the start event has occurred (termination-anchored
    /// schedules for still-employed staff).
    pub retention_start_at: Option<DateTime<Utc>>,
    /// Always retention_start_at + policy duration; NULL while the start is
    /// unknown.
    pub delete_eligible_at: Option<DateTime<Utc>>,
    pub status: ScheduleStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a schedule row.
#[derive(Debug, Clone)]
pub struct CreateRetentionSchedule {
    pub document_id: Uuid,
    pub policy_id: Uuid,
    pub start_event: RetentionStartEvent,
    pub retention_start_at: Option<DateTime<Utc>>,
    pub delete_eligible_at: Option<DateTime<Utc>>,
}

/// Read model for dashboards: a document's current compliance posture.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceState {
    pub document_id: Uuid,
    pub status: ScheduleStatus,
    pub delete_eligible_at: Option<DateTime<Utc>>,
    pub active_holds: Vec<LegalHold>,
    /// False whenever any active hold references the document.
    pub can_be_deleted: bool,
}
