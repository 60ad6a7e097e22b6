use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    audit_events::{AuditEventService, events, system_event, user_event},
    schedules::{RetentionScheduleService, ScheduleError},
};
use crate::{
    db::{DbError, DbPool},
    models::{
        CreateLegalHold, CreateLegalHoldScope, Document, Employee, HoldStatus, LegalHold,
        LegalHoldScope, LegalHoldWithCount, ScopeType,
    },
};

/// Errors that can occur during legal hold operations.
#[derive(Debug, thiserror::Error)]
pub enum LegalHoldError {
    #[error("Legal hold {0} not found")]
    NotFound(Uuid),

    #[error("Legal hold {0} is already released")]
    AlreadyReleased(Uuid),

    /// The hold's scope-to-target materialization never completed, so the
    /// set of protected documents is unknown. The hold must not be confirmed
    /// to the caller, and releasing it could resume deletion of documents it
    /// was meant to protect. Cleared by the repair pass.
    #[error("Legal hold {0} is not fully materialized")]
    MaterializationIncomplete(Uuid),

    #[error("Invalid legal hold input: {0}")]
    Validation(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type LegalHoldResult<T> = Result<T, LegalHoldError>;

/// True when `document` (owned by `employee`) falls under `scope`. Mirrors
/// the SQL predicate used for bulk materialization, applied in memory when a
/// single new document arrives.
pub fn document_matches_scope(
    scope: &LegalHoldScope,
    document: &Document,
    employee: &Employee,
) -> bool {
    match scope.scope_type {
        ScopeType::Employee => scope.employee_id == Some(document.employee_id),
        ScopeType::Department => {
            scope.department.is_some() && scope.department == employee.department
        }
        ScopeType::Category => scope.category.as_deref() == Some(document.category.as_str()),
        ScopeType::DateRange => match (scope.range_start, scope.range_end) {
            (Some(start), Some(end)) => {
                document.received_at >= start && document.received_at <= end
            }
            _ => false,
        },
        ScopeType::AllOrg => true,
    }
}

fn validate_scope(scope: &CreateLegalHoldScope) -> LegalHoldResult<()> {
    let missing = |field: &str| {
        LegalHoldError::Validation(format!(
            "Scope type {} requires {}",
            scope.scope_type, field
        ))
    };
    match scope.scope_type {
        ScopeType::Employee if scope.employee_id.is_none() => Err(missing("employee_id")),
        ScopeType::Department if scope.department.is_none() => Err(missing("department")),
        ScopeType::Category if scope.category.is_none() => Err(missing("category")),
        ScopeType::DateRange => match (scope.range_start, scope.range_end) {
            (Some(start), Some(end)) if start <= end => Ok(()),
            (Some(_), Some(_)) => Err(LegalHoldError::Validation(
                "Scope range_start must not be after range_end".to_string(),
            )),
            _ => Err(missing("range_start and range_end")),
        },
        _ => Ok(()),
    }
}

/// Manages legal holds: creation, scope-to-target materialization, release,
/// and the incremental check applied as new documents arrive.
#[derive(Clone)]
pub struct LegalHoldService {
    db: Arc<DbPool>,
    schedules: RetentionScheduleService,
    audit: AuditEventService,
}

impl LegalHoldService {
    pub fn new(db: Arc<DbPool>, schedules: RetentionScheduleService, audit: AuditEventService) -> Self {
        Self { db, schedules, audit }
    }

    /// Create a hold and synchronously materialize its scopes into concrete
    /// targets. Confirmation means every current document in scope carries a
    /// target; if materialization fails partway the hold stays persisted,
    /// active and unmaterialized for the repair pass, but the caller gets an
    /// error rather than a confirmation it cannot rely on.
    #[instrument(skip(self, input), fields(org_id = %org_id, title = %input.title))]
    pub async fn create_hold(
        &self,
        org_id: Uuid,
        input: CreateLegalHold,
        created_by: Uuid,
    ) -> LegalHoldResult<LegalHold> {
        if input.title.trim().is_empty() {
            return Err(LegalHoldError::Validation(
                "Hold title must not be empty".to_string(),
            ));
        }
        if input.scopes.is_empty() {
            return Err(LegalHoldError::Validation(
                "A hold must define at least one scope".to_string(),
            ));
        }
        for scope in &input.scopes {
            validate_scope(scope)?;
            if let Some(employee_id) = scope.employee_id {
                if scope.scope_type == ScopeType::Employee
                    && self.db.employees().get_by_id(org_id, employee_id).await?.is_none()
                {
                    return Err(LegalHoldError::Validation(format!(
                        "Employee {} does not exist in this organization",
                        employee_id
                    )));
                }
            }
        }

        let hold = self.db.legal_holds().create(org_id, input, created_by).await?;

        self.audit
            .record(
                org_id,
                user_event(
                    created_by,
                    events::LEGAL_HOLD_CREATED,
                    "legal_hold",
                    hold.id,
                    json!({"title": hold.title.clone()}),
                    None,
                ),
            )
            .await;

        if let Err(e) = self.materialize(org_id, &hold).await {
            // The hold is persisted and active and the repair worker will
            // finish its targets, but some in-scope documents are still
            // unprotected right now. Fail closed instead of confirming.
            error!(
                hold_id = %hold.id,
                error = %e,
                "Hold materialization incomplete, deferring to repair pass"
            );
            return Err(LegalHoldError::MaterializationIncomplete(hold.id));
        }

        self.db
            .legal_holds()
            .mark_materialized(org_id, hold.id, Utc::now())
            .await?;

        self.db
            .legal_holds()
            .get_by_id(org_id, hold.id)
            .await?
            .ok_or(LegalHoldError::NotFound(hold.id))
    }

    /// Resolve every scope of `hold` to targets and pause the matched
    /// schedules. Insert-if-absent targets and conditional pauses make this
    /// safe to run repeatedly over a partially-covered hold.
    async fn materialize(&self, org_id: Uuid, hold: &LegalHold) -> LegalHoldResult<()> {
        let scopes = self.db.legal_holds().list_scopes(org_id, hold.id).await?;
        let mut applied = 0usize;

        for scope in &scopes {
            let documents = self.db.documents().list_matching_scope(org_id, scope).await?;
            for document in documents {
                self.apply_to_document(org_id, hold, document.id).await?;
                applied += 1;
            }
        }

        info!(hold_id = %hold.id, scopes = scopes.len(), applied, "Hold materialized");
        Ok(())
    }

    /// Attach one document to a hold: target row, schedule pause, audit
    /// trail. Idempotent per (hold, document).
    async fn apply_to_document(
        &self,
        org_id: Uuid,
        hold: &LegalHold,
        document_id: Uuid,
    ) -> LegalHoldResult<()> {
        let inserted = self
            .db
            .legal_holds()
            .insert_target(org_id, hold.id, document_id)
            .await?;

        // Pause regardless of whether the target was new: a crash between
        // target insert and pause must be recoverable by rerunning.
        match self.schedules.on_hold_applied(org_id, document_id).await {
            Ok(()) => {}
            // Documents can predate the scheduling pipeline during backfill;
            // the target still blocks the sweep's re-verification.
            Err(ScheduleError::ScheduleNotFound(_)) => {
                warn!(
                    hold_id = %hold.id,
                    document_id = %document_id,
                    "Held document has no schedule to pause"
                );
            }
            Err(e) => return Err(e.into()),
        }

        if inserted {
            self.audit
                .record(
                    org_id,
                    system_event(
                        events::LEGAL_HOLD_APPLIED,
                        "legal_hold",
                        hold.id,
                        json!({"document_id": document_id}),
                        Some(format!("legal_hold.applied:{}:{}", hold.id, document_id)),
                    ),
                )
                .await;
        }

        Ok(())
    }

    /// Check one newly registered document against every active hold and
    /// attach it where a scope matches. Called inline at registration so a
    /// document arriving under an existing hold is protected immediately.
    pub async fn on_document_created(
        &self,
        org_id: Uuid,
        document: &Document,
        employee: &Employee,
    ) -> LegalHoldResult<()> {
        let holds = self.db.legal_holds().list_active(org_id).await?;
        for hold in holds {
            let scopes = self.db.legal_holds().list_scopes(org_id, hold.id).await?;
            if scopes
                .iter()
                .any(|scope| document_matches_scope(scope, document, employee))
            {
                self.apply_to_document(org_id, &hold, document.id).await?;
            }
        }
        Ok(())
    }

    /// Release a hold and resume every schedule no longer protected by any
    /// other active hold. Fails closed while materialization is incomplete.
    #[instrument(skip(self), fields(org_id = %org_id, hold_id = %hold_id))]
    pub async fn release_hold(
        &self,
        org_id: Uuid,
        hold_id: Uuid,
        released_by: Uuid,
    ) -> LegalHoldResult<LegalHold> {
        let hold = self
            .db
            .legal_holds()
            .get_by_id(org_id, hold_id)
            .await?
            .ok_or(LegalHoldError::NotFound(hold_id))?;

        if hold.status == HoldStatus::Released {
            return Err(LegalHoldError::AlreadyReleased(hold_id));
        }
        if hold.materialized_at.is_none() {
            return Err(LegalHoldError::MaterializationIncomplete(hold_id));
        }

        let released_at = Utc::now();
        let released = self
            .db
            .legal_holds()
            .release(org_id, hold_id, released_by, released_at)
            .await?;
        if !released {
            return Err(LegalHoldError::AlreadyReleased(hold_id));
        }

        self.audit
            .record(
                org_id,
                user_event(
                    released_by,
                    events::LEGAL_HOLD_RELEASED,
                    "legal_hold",
                    hold_id,
                    json!({"title": hold.title}),
                    None,
                ),
            )
            .await;

        // Resume only the documents with no other active hold; the schedule
        // service re-checks the target count per document.
        let targets = self.db.legal_holds().list_target_documents(org_id, hold_id).await?;
        for document_id in targets {
            match self.schedules.on_hold_released(org_id, document_id).await {
                Ok(()) => {}
                Err(ScheduleError::ScheduleNotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.db
            .legal_holds()
            .get_by_id(org_id, hold_id)
            .await?
            .ok_or(LegalHoldError::NotFound(hold_id))
    }

    /// Rerun materialization for an active hold that never completed it.
    /// Used by the repair worker and available as a manual operation.
    #[instrument(skip(self), fields(org_id = %org_id, hold_id = %hold_id))]
    pub async fn repair_hold(&self, org_id: Uuid, hold_id: Uuid) -> LegalHoldResult<LegalHold> {
        let hold = self
            .db
            .legal_holds()
            .get_by_id(org_id, hold_id)
            .await?
            .ok_or(LegalHoldError::NotFound(hold_id))?;

        if !hold.is_active() {
            return Err(LegalHoldError::AlreadyReleased(hold_id));
        }
        if hold.materialized_at.is_some() {
            return Ok(hold);
        }

        self.materialize(org_id, &hold).await?;
        self.db
            .legal_holds()
            .mark_materialized(org_id, hold_id, Utc::now())
            .await?;

        self.audit
            .record(
                org_id,
                system_event(
                    events::LEGAL_HOLD_REPAIRED,
                    "legal_hold",
                    hold_id,
                    json!({"title": hold.title}),
                    None,
                ),
            )
            .await;

        self.db
            .legal_holds()
            .get_by_id(org_id, hold_id)
            .await?
            .ok_or(LegalHoldError::NotFound(hold_id))
    }

    pub async fn get_hold(&self, org_id: Uuid, hold_id: Uuid) -> LegalHoldResult<LegalHold> {
        self.db
            .legal_holds()
            .get_by_id(org_id, hold_id)
            .await?
            .ok_or(LegalHoldError::NotFound(hold_id))
    }

    pub async fn list_holds(&self, org_id: Uuid) -> LegalHoldResult<Vec<LegalHoldWithCount>> {
        Ok(self.db.legal_holds().list_with_counts(org_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;

    fn test_employee(department: Option<&str>) -> Employee {
        Employee {
            org_id: Uuid::new_v4(),
            id: Uuid::new_v4(),
            department: department.map(String::from),
            work_state: "FL".to_string(),
            terminated_at: None,
            created_at: Utc::now(),
        }
    }

    fn test_document(employee: &Employee, category: &str) -> Document {
        Document {
            org_id: employee.org_id,
            id: Uuid::new_v4(),
            employee_id: employee.id,
            category: category.to_string(),
            received_at: Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
            content_path: Some("docs/test.pdf".to_string()),
            created_at: Utc::now(),
        }
    }

    fn scope(scope_type: ScopeType) -> LegalHoldScope {
        LegalHoldScope {
            org_id: Uuid::new_v4(),
            id: Uuid::new_v4(),
            hold_id: Uuid::new_v4(),
            scope_type,
            employee_id: None,
            department: None,
            category: None,
            range_start: None,
            range_end: None,
        }
    }

    #[test]
    fn employee_scope_matches_owner_only() {
        let employee = test_employee(Some("hr"));
        let document = test_document(&employee, "i9");

        let mut s = scope(ScopeType::Employee);
        s.employee_id = Some(employee.id);
        assert!(document_matches_scope(&s, &document, &employee));

        s.employee_id = Some(Uuid::new_v4());
        assert!(!document_matches_scope(&s, &document, &employee));
    }

    #[test]
    fn department_scope_requires_matching_department() {
        let employee = test_employee(Some("legal"));
        let document = test_document(&employee, "contract");

        let mut s = scope(ScopeType::Department);
        s.department = Some("legal".to_string());
        assert!(document_matches_scope(&s, &document, &employee));

        s.department = Some("hr".to_string());
        assert!(!document_matches_scope(&s, &document, &employee));

        // An employee without a department never matches a department scope.
        let no_dept = test_employee(None);
        let doc2 = test_document(&no_dept, "contract");
        s.department = Some("legal".to_string());
        assert!(!document_matches_scope(&s, &doc2, &no_dept));
    }

    #[test]
    fn category_scope_matches_exact_category() {
        let employee = test_employee(Some("hr"));
        let document = test_document(&employee, "w4");

        let mut s = scope(ScopeType::Category);
        s.category = Some("w4".to_string());
        assert!(document_matches_scope(&s, &document, &employee));

        s.category = Some("i9".to_string());
        assert!(!document_matches_scope(&s, &document, &employee));
    }

    #[test]
    fn date_range_scope_is_inclusive() {
        let employee = test_employee(Some("hr"));
        let document = test_document(&employee, "i9");

        let mut s = scope(ScopeType::DateRange);
        s.range_start = Some(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        s.range_end = Some(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        assert!(document_matches_scope(&s, &document, &employee));

        s.range_end = Some(Utc.with_ymd_and_hms(2024, 6, 15, 11, 59, 59).unwrap());
        s.range_start = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(!document_matches_scope(&s, &document, &employee));
    }

    #[test]
    fn all_org_scope_matches_everything() {
        let employee = test_employee(None);
        let document = test_document(&employee, "misc");
        assert!(document_matches_scope(&scope(ScopeType::AllOrg), &document, &employee));
    }

    #[test]
    fn scope_validation_rejects_missing_fields() {
        let input = CreateLegalHoldScope {
            scope_type: ScopeType::Department,
            employee_id: None,
            department: None,
            category: None,
            range_start: None,
            range_end: None,
        };
        assert!(matches!(
            validate_scope(&input),
            Err(LegalHoldError::Validation(_))
        ));

        let inverted = CreateLegalHoldScope {
            scope_type: ScopeType::DateRange,
            employee_id: None,
            department: None,
            category: None,
            range_start: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            range_end: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        };
        assert!(matches!(
            validate_scope(&inverted),
            Err(LegalHoldError::Validation(_))
        ));
    }

    #[test]
    fn terminated_employee_documents_still_match() {
        let mut employee = test_employee(Some("hr"));
        employee.terminated_at = NaiveDate::from_ymd_opt(2025, 1, 31);
        let document = test_document(&employee, "i9");

        let mut s = scope(ScopeType::Employee);
        s.employee_id = Some(employee.id);
        assert!(document_matches_scope(&s, &document, &employee));
    }
}
