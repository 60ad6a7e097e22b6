use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who owns a retention policy template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyScope {
    /// Deployment-wide fallback policy.
    System,
    /// Organization-level policy (referenced by state defaults).
    Org,
    /// Organization override for a specific document category.
    CategoryOverride,
}

impl std::fmt::Display for PolicyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyScope::System => write!(f, "system"),
            PolicyScope::Org => write!(f, "org"),
            PolicyScope::CategoryOverride => write!(f, "category_override"),
        }
    }
}

impl std::str::FromStr for PolicyScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(PolicyScope::System),
            "org" => Ok(PolicyScope::Org),
            "category_override" => Ok(PolicyScope::CategoryOverride),
            _ => Err(format!("Invalid policy scope: {}", s)),
        }
    }
}

/// Event that starts a document's retention clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionStartEvent {
    /// The clock starts when the document is received.
    DocumentReceived,
    /// The clock starts when the document's employee is terminated.
    EmploymentTerminated,
}

impl std::fmt::Display for RetentionStartEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetentionStartEvent::DocumentReceived => write!(f, "document_received"),
            RetentionStartEvent::EmploymentTerminated => write!(f, "employment_terminated"),
        }
    }
}

impl std::str::FromStr for RetentionStartEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document_received" => Ok(RetentionStartEvent::DocumentReceived),
            "employment_terminated" => Ok(RetentionStartEvent::EmploymentTerminated),
            _ => Err(format!("Invalid retention start event: {}", s)),
        }
    }
}

/// An immutable retention policy template.
///
/// Policies are never mutated after creation. A "change" creates a new policy
/// row and repoints the category/org reference; schedules that already
/// resolved the old policy keep it (grandfathering).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Owning tenant.
    pub org_id: Uuid,
    /// Unique policy identifier.
    pub id: Uuid,
    /// Ownership scope of this template.
    pub scope: PolicyScope,
    /// Document category, for category overrides only.
    pub category: Option<String>,
    /// Retention duration in years.
    pub duration_years: u32,
    /// Event that starts the retention clock.
    pub start_event: RetentionStartEvent,
    /// Whether this policy is the currently referenced one for its slot.
    pub active: bool,
    /// When the policy was created.
    pub created_at: DateTime<Utc>,
    /// User who created the policy, if not seeded by the system.
    pub created_by: Option<Uuid>,
}

/// Input for creating a retention policy.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRetentionPolicy {
    pub scope: PolicyScope,
    pub category: Option<String>,
    pub duration_years: u32,
    pub start_event: RetentionStartEvent,
}

/// Maps (state_code, effective_date) to a retention policy.
///
/// Multiple rows per state form a history. The resolver picks the latest row
/// whose effective_date is on or before the document's received date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRetentionDefault {
    pub org_id: Uuid,
    pub id: Uuid,
    pub state_code: String,
    pub effective_date: NaiveDate,
    pub policy_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_scope_round_trips() {
        for scope in [
            PolicyScope::System,
            PolicyScope::Org,
            PolicyScope::CategoryOverride,
        ] {
            assert_eq!(scope.to_string().parse::<PolicyScope>().unwrap(), scope);
        }
        assert!("bogus".parse::<PolicyScope>().is_err());
    }

    #[test]
    fn start_event_round_trips() {
        for event in [
            RetentionStartEvent::DocumentReceived,
            RetentionStartEvent::EmploymentTerminated,
        ] {
            assert_eq!(
                event.to_string().parse::<RetentionStartEvent>().unwrap(),
                event
            );
        }
    }
}
