use async_trait::async_trait;
use uuid::Uuid;

use super::ListResult;
use crate::{
    db::error::DbResult,
    models::{AuditEvent, AuditEventQuery, CreateAuditEvent},
};

#[async_trait]
pub trait AuditEventRepo: Send + Sync {
    /// Append an event. Idempotent on the caller-supplied dedup key:
    /// returns None if an event with that key was already appended.
    async fn append(&self, org_id: Uuid, input: CreateAuditEvent)
    -> DbResult<Option<AuditEvent>>;

    /// Query the ledger, newest first, with keyset pagination over
    /// (created_at, id). Results are stable snapshots: rows are never
    /// mutated post-append.
    async fn list(&self, org_id: Uuid, query: AuditEventQuery) -> DbResult<ListResult<AuditEvent>>;

    /// All events for one entity, oldest first. Used for state replay.
    async fn list_for_entity(
        &self,
        org_id: Uuid,
        entity_type: &str,
        entity_id: Uuid,
    ) -> DbResult<Vec<AuditEvent>>;
}
