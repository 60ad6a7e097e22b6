use async_trait::async_trait;
use uuid::Uuid;

use crate::{db::error::DbResult, models::Tombstone};

#[async_trait]
pub trait TombstoneRepo: Send + Sync {
    /// Insert-if-absent. Returns true when the tombstone is new; false when
    /// the document was already tombstoned (recovery after a crash between
    /// tombstone write and status flip).
    async fn insert(&self, tombstone: Tombstone) -> DbResult<bool>;

    async fn get(&self, org_id: Uuid, document_id: Uuid) -> DbResult<Option<Tombstone>>;
}
