mod audit_events;
mod common;
mod documents;
mod employees;
mod legal_holds;
mod policies;
mod schedules;
mod tombstones;

pub use audit_events::SqliteAuditEventRepo;
pub use documents::SqliteDocumentRepo;
pub use employees::SqliteEmployeeRepo;
pub use legal_holds::SqliteLegalHoldRepo;
pub use policies::SqliteRetentionPolicyRepo;
pub use schedules::SqliteRetentionScheduleRepo;
pub use tombstones::SqliteTombstoneRepo;
