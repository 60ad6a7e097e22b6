use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Type of actor that caused a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditActorType {
    /// A user of the surrounding product performed the action.
    User,
    /// The engine performed the action automatically (sweep, repair).
    System,
}

impl std::fmt::Display for AuditActorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditActorType::User => write!(f, "user"),
            AuditActorType::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for AuditActorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(AuditActorType::User),
            "system" => Ok(AuditActorType::System),
            _ => Err(format!("Invalid actor type: {}", s)),
        }
    }
}

/// An append-only ledger entry. Never updated or deleted after append.
///
/// Total order is (created_at, id); ids are UUIDv7 so concurrent writers
/// produce ids consistent with that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub org_id: Uuid,
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub actor_type: AuditActorType,
    /// None for system actions.
    pub actor_id: Option<Uuid>,
    /// Dotted event name, e.g. "retention.executed" (open-ended set, see
    /// the constants in services::audit_events::events).
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub payload: JsonValue,
}

/// Input for appending a ledger entry.
#[derive(Debug, Clone)]
pub struct CreateAuditEvent {
    pub actor_type: AuditActorType,
    pub actor_id: Option<Uuid>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub payload: JsonValue,
    /// Caller-supplied idempotency key. A re-append with the same key (from
    /// a retried, partially-applied batch) is a no-op.
    pub dedup_key: Option<String>,
}

/// Filters for querying the ledger. Results are a stable, time-ordered,
/// cursor-restartable sequence; events are immutable post-append.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditEventQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub event_type: Option<String>,
    /// Start of time range (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// End of time range (exclusive).
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    /// Cursor for keyset pagination.
    pub cursor: Option<String>,
    /// Pagination direction ("forward" or "backward"). Only used with cursor.
    #[serde(default)]
    pub direction: Option<String>,
}
