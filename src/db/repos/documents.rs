use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateDocument, Document, LegalHoldScope},
};

#[async_trait]
pub trait DocumentRepo: Send + Sync {
    /// Register a document. `DbError::Conflict` if the id already exists.
    async fn create(&self, org_id: Uuid, input: CreateDocument) -> DbResult<Document>;

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<Document>>;

    async fn list_by_employee(&self, org_id: Uuid, employee_id: Uuid) -> DbResult<Vec<Document>>;

    /// Evaluate one abstract hold scope against the current document
    /// population. Used for initial and repair materialization; incremental
    /// matching of new documents happens in the service layer.
    async fn list_matching_scope(
        &self,
        org_id: Uuid,
        scope: &LegalHoldScope,
    ) -> DbResult<Vec<Document>>;

    /// Null out the content path after the content has been deleted.
    async fn clear_content_path(&self, org_id: Uuid, id: Uuid) -> DbResult<()>;
}
