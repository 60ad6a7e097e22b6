use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    audit_events::{AuditEventService, events, system_event},
    legal_holds::{LegalHoldError, LegalHoldService},
    policy_resolver::{PolicyError, PolicyResolverService},
    schedules::{RetentionScheduleService, ScheduleError},
};
use crate::{
    db::{DbError, DbPool},
    models::{CreateDocument, CreateEmployee, Document, Employee, RetentionSchedule},
};

/// Errors that can occur during document and employee intake.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Document {0} not found")]
    NotFound(Uuid),

    #[error("Employee {0} not found")]
    EmployeeNotFound(Uuid),

    #[error("Invalid document input: {0}")]
    Validation(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    LegalHold(#[from] LegalHoldError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// A registered document together with its schedule, the intake result
/// returned to the ingestion collaborator.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RegisteredDocument {
    pub document: Document,
    pub schedule: RetentionSchedule,
}

/// Intake facade: mirrors employee and document records delivered by the
/// surrounding product and drives scheduling and hold attachment for each
/// new document.
#[derive(Clone)]
pub struct DocumentService {
    db: Arc<DbPool>,
    policies: PolicyResolverService,
    schedules: RetentionScheduleService,
    legal_holds: LegalHoldService,
    audit: AuditEventService,
}

impl DocumentService {
    pub fn new(
        db: Arc<DbPool>,
        policies: PolicyResolverService,
        schedules: RetentionScheduleService,
        legal_holds: LegalHoldService,
        audit: AuditEventService,
    ) -> Self {
        Self { db, policies, schedules, legal_holds, audit }
    }

    /// Mirror an employee record. Idempotent on redelivery: an existing row
    /// is returned unchanged.
    #[instrument(skip(self, input), fields(org_id = %org_id, employee_id = %input.id))]
    pub async fn register_employee(
        &self,
        org_id: Uuid,
        input: CreateEmployee,
    ) -> DocumentResult<Employee> {
        if input.work_state.len() != 2 || !input.work_state.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(DocumentError::Validation(format!(
                "work_state must be a two-letter state code, got {:?}",
                input.work_state
            )));
        }
        Ok(self.db.employees().upsert(org_id, input).await?)
    }

    /// Register a document and put it under retention: resolve the effective
    /// policy, create the schedule, and attach any active holds whose scopes
    /// match. Redelivery of an already-registered document emits no new
    /// events but repairs a missing schedule and any missed hold attachment.
    #[instrument(skip(self, input), fields(org_id = %org_id, document_id = %input.id))]
    pub async fn register_document(
        &self,
        org_id: Uuid,
        input: CreateDocument,
    ) -> DocumentResult<RegisteredDocument> {
        if input.category.trim().is_empty() {
            return Err(DocumentError::Validation(
                "Document category must not be empty".to_string(),
            ));
        }

        let employee = self
            .db
            .employees()
            .get_by_id(org_id, input.employee_id)
            .await?
            .ok_or(DocumentError::EmployeeNotFound(input.employee_id))?;

        let document = match self.db.documents().create(org_id, input.clone()).await {
            Ok(document) => document,
            Err(DbError::Conflict(_)) => {
                // Redelivery. Keep the stored row authoritative; finish any
                // scheduling and hold-attachment work a crashed earlier
                // attempt left undone. Both repairs are idempotent, so a
                // clean redelivery changes nothing.
                let existing = self
                    .db
                    .documents()
                    .get_by_id(org_id, input.id)
                    .await?
                    .ok_or(DocumentError::NotFound(input.id))?;
                let schedule = self.ensure_schedule(org_id, &existing, &employee).await?;
                self.legal_holds
                    .on_document_created(org_id, &existing, &employee)
                    .await?;
                return Ok(RegisteredDocument { document: existing, schedule });
            }
            Err(e) => return Err(e.into()),
        };

        self.audit
            .record(
                org_id,
                system_event(
                    events::DOCUMENT_REGISTERED,
                    "document",
                    document.id,
                    json!({
                        "employee_id": document.employee_id,
                        "category": document.category,
                        "received_at": document.received_at,
                    }),
                    Some(format!("document.registered:{}", document.id)),
                ),
            )
            .await;

        let schedule = self.ensure_schedule(org_id, &document, &employee).await?;

        self.legal_holds
            .on_document_created(org_id, &document, &employee)
            .await?;

        Ok(RegisteredDocument { document, schedule })
    }

    /// Resolve a policy for `document` and create its schedule if absent.
    async fn ensure_schedule(
        &self,
        org_id: Uuid,
        document: &Document,
        employee: &Employee,
    ) -> DocumentResult<RetentionSchedule> {
        if let Some(schedule) = self
            .db
            .schedules()
            .get_by_document(org_id, document.id)
            .await?
        {
            return Ok(schedule);
        }

        let policy = self
            .policies
            .resolve(
                org_id,
                &employee.work_state,
                &document.category,
                document.received_at.date_naive(),
            )
            .await?;

        Ok(self
            .schedules
            .create_schedule(org_id, document, &policy, employee)
            .await?)
    }

    pub async fn get_document(&self, org_id: Uuid, id: Uuid) -> DocumentResult<Document> {
        self.db
            .documents()
            .get_by_id(org_id, id)
            .await?
            .ok_or(DocumentError::NotFound(id))
    }

    /// Record a termination and recompute every schedule of the employee's
    /// documents. Termination starts the clock for employment-anchored
    /// policies that were waiting on it.
    #[instrument(skip(self), fields(org_id = %org_id, employee_id = %employee_id))]
    pub async fn on_employment_terminated(
        &self,
        org_id: Uuid,
        employee_id: Uuid,
        terminated_at: NaiveDate,
    ) -> DocumentResult<Employee> {
        let employee = match self
            .db
            .employees()
            .set_terminated(org_id, employee_id, terminated_at)
            .await
        {
            Ok(employee) => employee,
            Err(DbError::NotFound) => return Err(DocumentError::EmployeeNotFound(employee_id)),
            Err(e) => return Err(e.into()),
        };

        self.audit
            .record(
                org_id,
                system_event(
                    events::EMPLOYEE_TERMINATED,
                    "employee",
                    employee_id,
                    json!({"terminated_at": terminated_at}),
                    Some(format!("employee.terminated:{}:{}", employee_id, terminated_at)),
                ),
            )
            .await;

        let documents = self.db.documents().list_by_employee(org_id, employee_id).await?;
        info!(
            employee_id = %employee_id,
            documents = documents.len(),
            "Recomputing schedules after termination"
        );
        for document in documents {
            match self.schedules.recompute(org_id, document.id).await {
                Ok(_) => {}
                // A document may have slipped through scheduling; nothing to
                // recompute, the registration repair path owns it.
                Err(ScheduleError::ScheduleNotFound(_)) => {
                    warn!(document_id = %document.id, "No schedule to recompute");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(employee)
    }
}
