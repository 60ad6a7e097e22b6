use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{
        CreateLegalHold, LegalHold, LegalHoldScope, LegalHoldWithCount,
    },
};

#[async_trait]
pub trait LegalHoldRepo: Send + Sync {
    /// Persist a hold and its scopes in one transaction. The hold starts
    /// active and unmaterialized.
    async fn create(
        &self,
        org_id: Uuid,
        input: CreateLegalHold,
        created_by: Uuid,
    ) -> DbResult<LegalHold>;

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<LegalHold>>;

    async fn list_with_counts(&self, org_id: Uuid) -> DbResult<Vec<LegalHoldWithCount>>;

    async fn list_active(&self, org_id: Uuid) -> DbResult<Vec<LegalHold>>;

    async fn list_scopes(&self, org_id: Uuid, hold_id: Uuid) -> DbResult<Vec<LegalHoldScope>>;

    /// Record that initial materialization completed in full.
    async fn mark_materialized(&self, org_id: Uuid, id: Uuid, at: DateTime<Utc>) -> DbResult<()>;

    /// Active holds whose initial materialization never completed, across
    /// all tenants. Input for the repair worker.
    async fn list_unmaterialized_active(&self) -> DbResult<Vec<LegalHold>>;

    /// Conditional release: succeeds only while the hold is active. Returns
    /// false when the hold was already released.
    async fn release(
        &self,
        org_id: Uuid,
        id: Uuid,
        released_by: Uuid,
        released_at: DateTime<Utc>,
    ) -> DbResult<bool>;

    /// Insert-if-absent target creation (unique on hold + document). Returns
    /// true when the target is new, false when it already existed — safe
    /// under concurrent materialization.
    async fn insert_target(&self, org_id: Uuid, hold_id: Uuid, document_id: Uuid)
    -> DbResult<bool>;

    /// Document ids this hold targets (historical evidence included).
    async fn list_target_documents(&self, org_id: Uuid, hold_id: Uuid) -> DbResult<Vec<Uuid>>;

    /// Number of targets on a document whose parent hold is still active.
    /// The O(1) enforcement check consulted before any deletion.
    async fn count_active_targets(&self, org_id: Uuid, document_id: Uuid) -> DbResult<i64>;

    /// The active holds currently protecting a document.
    async fn active_holds_for_document(
        &self,
        org_id: Uuid,
        document_id: Uuid,
    ) -> DbResult<Vec<LegalHold>>;
}
