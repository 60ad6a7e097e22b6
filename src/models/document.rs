use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registry entry for a document, fed by the document-ingestion collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub org_id: Uuid,
    pub id: Uuid,
    pub employee_id: Uuid,
    pub category: String,
    pub received_at: DateTime<Utc>,
    /// Location of the document content; NULL once the content is deleted.
    pub content_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a document. The id is assigned by the collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocument {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub category: String,
    pub received_at: DateTime<Utc>,
    pub content_path: Option<String>,
}
