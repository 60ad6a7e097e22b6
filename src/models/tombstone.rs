use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permanent record that a document's content was deleted, retained for
/// audit purposes after the content itself is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tombstone {
    pub org_id: Uuid,
    pub document_id: Uuid,
    /// The policy the deletion was executed under.
    pub policy_id: Uuid,
    pub deleted_at: DateTime<Utc>,
    /// Always "system"; deletion is executed only by the sweep.
    pub actor: String,
}
