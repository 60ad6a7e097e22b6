use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateRetentionSchedule, RetentionSchedule, ScheduleStatus},
};

#[async_trait]
pub trait RetentionScheduleRepo: Send + Sync {
    /// Create the schedule row for a document. `DbError::Conflict` if the
    /// document already has one (schedules are 1:1 with documents).
    async fn create(
        &self,
        org_id: Uuid,
        input: CreateRetentionSchedule,
    ) -> DbResult<RetentionSchedule>;

    async fn get_by_document(
        &self,
        org_id: Uuid,
        document_id: Uuid,
    ) -> DbResult<Option<RetentionSchedule>>;

    /// Conditionally rewrite the computed clock fields, guarded by the
    /// version read beforehand. Returns false when another writer got there
    /// first (caller re-reads and retries).
    async fn update_computed(
        &self,
        org_id: Uuid,
        id: Uuid,
        expected_version: i64,
        retention_start_at: Option<DateTime<Utc>>,
        delete_eligible_at: Option<DateTime<Utc>>,
    ) -> DbResult<bool>;

    /// Conditional status transition: succeeds only if the row is currently
    /// in `from`. Returns false otherwise; lost updates are impossible by
    /// construction.
    async fn transition_status(
        &self,
        org_id: Uuid,
        id: Uuid,
        from: ScheduleStatus,
        to: ScheduleStatus,
    ) -> DbResult<bool>;

    /// Sweep candidates across all tenants: status = scheduled and
    /// delete_eligible_at <= now, oldest deadline first.
    async fn list_delete_eligible(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<RetentionSchedule>>;
}
