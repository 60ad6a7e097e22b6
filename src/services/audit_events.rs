use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    db::{DbPool, DbResult, repos::ListResult},
    models::{AuditActorType, AuditEvent, AuditEventQuery, CreateAuditEvent},
};

/// Event types emitted by the engine. The set is open-ended; these constants
/// cover every transition the engine itself performs.
pub mod events {
    pub const RETENTION_SCHEDULED: &str = "retention.scheduled";
    pub const RETENTION_RECOMPUTED: &str = "retention.recomputed";
    pub const RETENTION_PAUSED: &str = "retention.paused";
    pub const RETENTION_RESUMED: &str = "retention.resumed";
    pub const RETENTION_EXECUTED: &str = "retention.executed";
    pub const RETENTION_CANCELED: &str = "retention.canceled";

    pub const LEGAL_HOLD_CREATED: &str = "legal_hold.created";
    pub const LEGAL_HOLD_APPLIED: &str = "legal_hold.applied";
    pub const LEGAL_HOLD_RELEASED: &str = "legal_hold.released";
    pub const LEGAL_HOLD_REPAIRED: &str = "legal_hold.repaired";

    pub const DOCUMENT_REGISTERED: &str = "document.registered";
    pub const DOCUMENT_DELETED: &str = "document.deleted";
    pub const EMPLOYEE_TERMINATED: &str = "employee.terminated";

    pub const POLICY_CREATED: &str = "policy.created";
    pub const POLICY_SEEDED: &str = "policy.seeded";
}

/// Attempts for a failed ledger append before giving up.
const APPEND_RETRIES: u32 = 3;

/// Build a system-actor event input.
pub fn system_event(
    event_type: &str,
    entity_type: &str,
    entity_id: Uuid,
    payload: JsonValue,
    dedup_key: Option<String>,
) -> CreateAuditEvent {
    CreateAuditEvent {
        actor_type: AuditActorType::System,
        actor_id: None,
        event_type: event_type.to_string(),
        entity_type: entity_type.to_string(),
        entity_id,
        payload,
        dedup_key,
    }
}

/// Build a user-actor event input.
pub fn user_event(
    actor_id: Uuid,
    event_type: &str,
    entity_type: &str,
    entity_id: Uuid,
    payload: JsonValue,
    dedup_key: Option<String>,
) -> CreateAuditEvent {
    CreateAuditEvent {
        actor_type: AuditActorType::User,
        actor_id: Some(actor_id),
        event_type: event_type.to_string(),
        entity_type: entity_type.to_string(),
        entity_id,
        payload,
        dedup_key,
    }
}

/// Service layer over the append-only audit ledger.
#[derive(Clone)]
pub struct AuditEventService {
    db: Arc<DbPool>,
}

impl AuditEventService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Append an event, propagating failures to the caller. Returns None
    /// when the dedup key already exists.
    pub async fn append(
        &self,
        org_id: Uuid,
        input: CreateAuditEvent,
    ) -> DbResult<Option<AuditEvent>> {
        self.db.audit_events().append(org_id, input).await
    }

    /// Append an event without failing the caller's business transaction.
    ///
    /// The append is retried a bounded number of times; exhausting the
    /// retries logs the loss at error level. Business state has already been
    /// durably committed when this runs, so dropping the event is preferable
    /// to rolling the operation back.
    pub async fn record(&self, org_id: Uuid, input: CreateAuditEvent) {
        for attempt in 1..=APPEND_RETRIES {
            match self.db.audit_events().append(org_id, input.clone()).await {
                Ok(_) => return,
                Err(e) if attempt < APPEND_RETRIES => {
                    warn!(
                        event_type = %input.event_type,
                        attempt,
                        error = %e,
                        "Audit append failed, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(50 * attempt as u64))
                        .await;
                }
                Err(e) => {
                    error!(
                        event_type = %input.event_type,
                        entity_id = %input.entity_id,
                        error = %e,
                        "Audit append failed after retries, event lost"
                    );
                }
            }
        }
    }

    /// Query the ledger, newest first, with cursor pagination.
    pub async fn list(
        &self,
        org_id: Uuid,
        query: AuditEventQuery,
    ) -> DbResult<ListResult<AuditEvent>> {
        self.db.audit_events().list(org_id, query).await
    }

    /// Full history for one entity, oldest first.
    pub async fn list_for_entity(
        &self,
        org_id: Uuid,
        entity_type: &str,
        entity_id: Uuid,
    ) -> DbResult<Vec<AuditEvent>> {
        self.db
            .audit_events()
            .list_for_entity(org_id, entity_type, entity_id)
            .await
    }
}
