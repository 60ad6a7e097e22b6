use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateRetentionPolicy, RetentionPolicy, StateRetentionDefault},
};

#[async_trait]
pub trait RetentionPolicyRepo: Send + Sync {
    /// Create an immutable policy template.
    async fn create(
        &self,
        org_id: Uuid,
        input: CreateRetentionPolicy,
        created_by: Option<Uuid>,
    ) -> DbResult<RetentionPolicy>;

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<RetentionPolicy>>;

    /// The active category override for (org, category), if any.
    async fn find_active_category_override(
        &self,
        org_id: Uuid,
        category: &str,
    ) -> DbResult<Option<RetentionPolicy>>;

    /// The active system fallback policy for the org, if configured.
    async fn find_system_fallback(&self, org_id: Uuid) -> DbResult<Option<RetentionPolicy>>;

    /// Mark a policy inactive. Used when repointing a reference to a
    /// replacement policy; the row itself is never mutated otherwise.
    async fn deactivate(&self, org_id: Uuid, id: Uuid) -> DbResult<()>;

    /// Record a state default row mapping (state, effective date) -> policy.
    async fn create_state_default(
        &self,
        org_id: Uuid,
        state_code: &str,
        effective_date: NaiveDate,
        policy_id: Uuid,
    ) -> DbResult<StateRetentionDefault>;

    /// The policy referenced by the latest state default whose effective
    /// date is on or before `as_of`.
    async fn find_state_default(
        &self,
        org_id: Uuid,
        state_code: &str,
        as_of: NaiveDate,
    ) -> DbResult<Option<RetentionPolicy>>;
}
