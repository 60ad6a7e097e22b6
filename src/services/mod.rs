pub mod audit_events;
pub mod documents;
pub mod file_storage;
pub mod legal_holds;
pub mod policy_resolver;
pub mod schedules;

use std::sync::Arc;

pub use audit_events::AuditEventService;
pub use documents::{DocumentError, DocumentService, RegisteredDocument};
pub use file_storage::{FileStorage, FileStorageError, build_file_storage};
pub use legal_holds::{LegalHoldError, LegalHoldService};
pub use policy_resolver::{PolicyError, PolicyResolverService};
pub use schedules::{RetentionScheduleService, ScheduleError};

use crate::db::DbPool;

/// Container for all services, wired once at startup and cloned into
/// handlers and background workers.
#[derive(Clone)]
pub struct Services {
    pub audit_events: AuditEventService,
    pub policies: PolicyResolverService,
    pub schedules: RetentionScheduleService,
    pub legal_holds: LegalHoldService,
    pub documents: DocumentService,
    pub file_storage: Arc<dyn FileStorage>,
    pub db: Arc<DbPool>,
}

impl Services {
    pub fn new(db: Arc<DbPool>, file_storage: Arc<dyn FileStorage>) -> Self {
        let audit_events = AuditEventService::new(db.clone());
        let policies = PolicyResolverService::new(db.clone(), audit_events.clone());
        let schedules = RetentionScheduleService::new(db.clone(), audit_events.clone());
        let legal_holds =
            LegalHoldService::new(db.clone(), schedules.clone(), audit_events.clone());
        let documents = DocumentService::new(
            db.clone(),
            policies.clone(),
            schedules.clone(),
            legal_holds.clone(),
            audit_events.clone(),
        );

        Self {
            audit_events,
            policies,
            schedules,
            legal_holds,
            documents,
            file_storage,
            db,
        }
    }
}
