use std::sync::Arc;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    audit_events::{AuditEventService, events, system_event},
    policy_resolver::PolicyError,
};
use crate::{
    db::{DbError, DbPool},
    models::{
        ComplianceState, CreateRetentionSchedule, Document, Employee, RetentionPolicy,
        RetentionSchedule, RetentionStartEvent, ScheduleStatus,
    },
};

/// Errors that can occur during schedule operations.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Document {0} has no retention schedule")]
    ScheduleNotFound(Uuid),

    #[error("Document {0} not found")]
    DocumentNotFound(Uuid),

    #[error("Employee {0} not found")]
    EmployeeNotFound(Uuid),

    /// Conditional writes kept losing to concurrent writers. Transient;
    /// the caller may retry the whole operation.
    #[error("Concurrent update conflict on schedule for document {0}")]
    ConflictRetriesExhausted(Uuid),

    #[error("Invalid schedule input: {0}")]
    Validation(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Attempts for a version-guarded write before reporting a transient failure.
const CONDITIONAL_WRITE_RETRIES: u32 = 3;

/// `start + duration_years`, calendar-aware (a leap-day start lands on
/// Feb 28 in a non-leap target year).
fn add_years(start: DateTime<Utc>, years: u32) -> ScheduleResult<DateTime<Utc>> {
    start
        .checked_add_months(Months::new(years * 12))
        .ok_or_else(|| {
            ScheduleError::Validation(format!("Retention deadline overflows: {} + {}y", start, years))
        })
}

/// Midnight UTC of a calendar date, for termination-anchored clocks.
fn date_to_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// The retention clock a schedule should carry right now: `(start, deadline)`,
/// both None while the start event has not occurred.
fn compute_clock(
    policy: &RetentionPolicy,
    start_event: RetentionStartEvent,
    document: &Document,
    employee: &Employee,
) -> ScheduleResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let start = match start_event {
        RetentionStartEvent::DocumentReceived => Some(document.received_at),
        RetentionStartEvent::EmploymentTerminated => employee.terminated_at.map(date_to_utc),
    };
    let deadline = match start {
        Some(start) => Some(add_years(start, policy.duration_years)?),
        None => None,
    };
    Ok((start, deadline))
}

/// Maintains the one-per-document retention schedules.
///
/// Owns the schedule status transitions triggered by hold state; targets and
/// tombstones are owned elsewhere.
#[derive(Clone)]
pub struct RetentionScheduleService {
    db: Arc<DbPool>,
    audit: AuditEventService,
}

impl RetentionScheduleService {
    pub fn new(db: Arc<DbPool>, audit: AuditEventService) -> Self {
        Self { db, audit }
    }

    /// Create the schedule for a freshly registered document under an
    /// already-resolved policy. Returns the existing schedule unchanged if
    /// one is already present (idempotent re-delivery).
    #[instrument(skip(self, document, policy, employee), fields(org_id = %org_id, document_id = %document.id))]
    pub async fn create_schedule(
        &self,
        org_id: Uuid,
        document: &Document,
        policy: &RetentionPolicy,
        employee: &Employee,
    ) -> ScheduleResult<RetentionSchedule> {
        let (retention_start_at, delete_eligible_at) =
            compute_clock(policy, policy.start_event, document, employee)?;

        let created = self
            .db
            .schedules()
            .create(
                org_id,
                CreateRetentionSchedule {
                    document_id: document.id,
                    policy_id: policy.id,
                    start_event: policy.start_event,
                    retention_start_at,
                    delete_eligible_at,
                },
            )
            .await;

        let schedule = match created {
            Ok(schedule) => schedule,
            Err(DbError::Conflict(_)) => {
                return self
                    .db
                    .schedules()
                    .get_by_document(org_id, document.id)
                    .await?
                    .ok_or(ScheduleError::ScheduleNotFound(document.id));
            }
            Err(e) => return Err(e.into()),
        };

        self.audit
            .record(
                org_id,
                system_event(
                    events::RETENTION_SCHEDULED,
                    "schedule",
                    schedule.id,
                    json!({
                        "document_id": document.id,
                        "policy_id": policy.id,
                        "start_event": policy.start_event.to_string(),
                        "delete_eligible_at": delete_eligible_at,
                    }),
                    Some(format!("retention.scheduled:{}", document.id)),
                ),
            )
            .await;

        Ok(schedule)
    }

    /// Recompute a schedule's clock from its stored policy.
    ///
    /// The stored policy id is used as-is, never re-resolved: schedules are
    /// grandfathered when the org repoints its policy references. Idempotent:
    /// unchanged inputs produce no write and no audit event.
    #[instrument(skip(self), fields(org_id = %org_id, document_id = %document_id))]
    pub async fn recompute(
        &self,
        org_id: Uuid,
        document_id: Uuid,
    ) -> ScheduleResult<RetentionSchedule> {
        let mut schedule = self
            .db
            .schedules()
            .get_by_document(org_id, document_id)
            .await?
            .ok_or(ScheduleError::ScheduleNotFound(document_id))?;

        if schedule.status.is_terminal() {
            return Ok(schedule);
        }

        let document = self
            .db
            .documents()
            .get_by_id(org_id, document_id)
            .await?
            .ok_or(ScheduleError::DocumentNotFound(document_id))?;
        let employee = self
            .db
            .employees()
            .get_by_id(org_id, document.employee_id)
            .await?
            .ok_or(ScheduleError::EmployeeNotFound(document.employee_id))?;
        let policy = self
            .db
            .policies()
            .get_by_id(org_id, schedule.policy_id)
            .await?
            .ok_or(PolicyError::NotFound(schedule.policy_id))?;

        for _ in 0..CONDITIONAL_WRITE_RETRIES {
            let (start, deadline) =
                compute_clock(&policy, schedule.start_event, &document, &employee)?;

            if schedule.retention_start_at == start && schedule.delete_eligible_at == deadline {
                debug!(document_id = %document_id, "Recompute produced no change");
                return Ok(schedule);
            }

            let won = self
                .db
                .schedules()
                .update_computed(org_id, schedule.id, schedule.version, start, deadline)
                .await?;

            if won {
                self.audit
                    .record(
                        org_id,
                        system_event(
                            events::RETENTION_RECOMPUTED,
                            "schedule",
                            schedule.id,
                            json!({
                                "document_id": document_id,
                                "retention_start_at": start,
                                "delete_eligible_at": deadline,
                            }),
                            None,
                        ),
                    )
                    .await;
                schedule.retention_start_at = start;
                schedule.delete_eligible_at = deadline;
                schedule.version += 1;
                return Ok(schedule);
            }

            // Lost to a concurrent writer; re-read and re-evaluate.
            schedule = self
                .db
                .schedules()
                .get_by_document(org_id, document_id)
                .await?
                .ok_or(ScheduleError::ScheduleNotFound(document_id))?;
            if schedule.status.is_terminal() {
                return Ok(schedule);
            }
        }

        Err(ScheduleError::ConflictRetriesExhausted(document_id))
    }

    /// Pause enforcement because an active hold targets the document.
    /// Idempotent: overlapping holds collapse to one paused state.
    pub async fn on_hold_applied(&self, org_id: Uuid, document_id: Uuid) -> ScheduleResult<()> {
        let schedule = self
            .db
            .schedules()
            .get_by_document(org_id, document_id)
            .await?
            .ok_or(ScheduleError::ScheduleNotFound(document_id))?;

        let paused = self
            .db
            .schedules()
            .transition_status(
                org_id,
                schedule.id,
                ScheduleStatus::Scheduled,
                ScheduleStatus::PausedLegalHold,
            )
            .await?;

        if paused {
            self.audit
                .record(
                    org_id,
                    system_event(
                        events::RETENTION_PAUSED,
                        "schedule",
                        schedule.id,
                        json!({"document_id": document_id}),
                        None,
                    ),
                )
                .await;
        }

        Ok(())
    }

    /// Resume enforcement after a hold release, but only when no other
    /// active hold still targets the document. Release of hold A must never
    /// resume deletion while hold B still applies.
    pub async fn on_hold_released(&self, org_id: Uuid, document_id: Uuid) -> ScheduleResult<()> {
        let remaining = self
            .db
            .legal_holds()
            .count_active_targets(org_id, document_id)
            .await?;
        if remaining > 0 {
            debug!(
                document_id = %document_id,
                remaining, "Document still held, schedule stays paused"
            );
            return Ok(());
        }

        let schedule = self
            .db
            .schedules()
            .get_by_document(org_id, document_id)
            .await?
            .ok_or(ScheduleError::ScheduleNotFound(document_id))?;

        let resumed = self
            .db
            .schedules()
            .transition_status(
                org_id,
                schedule.id,
                ScheduleStatus::PausedLegalHold,
                ScheduleStatus::Scheduled,
            )
            .await?;

        if resumed {
            self.audit
                .record(
                    org_id,
                    system_event(
                        events::RETENTION_RESUMED,
                        "schedule",
                        schedule.id,
                        json!({"document_id": document_id}),
                        None,
                    ),
                )
                .await;
        }

        Ok(())
    }

    /// Withdraw a schedule because the document left through another
    /// channel. No-op on schedules already in a terminal state.
    #[instrument(skip(self), fields(org_id = %org_id, document_id = %document_id))]
    pub async fn cancel(&self, org_id: Uuid, document_id: Uuid) -> ScheduleResult<()> {
        for _ in 0..CONDITIONAL_WRITE_RETRIES {
            let schedule = self
                .db
                .schedules()
                .get_by_document(org_id, document_id)
                .await?
                .ok_or(ScheduleError::ScheduleNotFound(document_id))?;

            if schedule.status.is_terminal() {
                return Ok(());
            }

            let canceled = self
                .db
                .schedules()
                .transition_status(org_id, schedule.id, schedule.status, ScheduleStatus::Canceled)
                .await?;

            if canceled {
                info!(document_id = %document_id, "Retention schedule canceled");
                self.audit
                    .record(
                        org_id,
                        system_event(
                            events::RETENTION_CANCELED,
                            "schedule",
                            schedule.id,
                            json!({"document_id": document_id, "from": schedule.status.to_string()}),
                            None,
                        ),
                    )
                    .await;
                return Ok(());
            }
        }

        Err(ScheduleError::ConflictRetriesExhausted(document_id))
    }

    /// Current compliance posture of a document, for dashboards.
    pub async fn compliance_state(
        &self,
        org_id: Uuid,
        document_id: Uuid,
    ) -> ScheduleResult<ComplianceState> {
        let schedule = self
            .db
            .schedules()
            .get_by_document(org_id, document_id)
            .await?
            .ok_or(ScheduleError::ScheduleNotFound(document_id))?;

        let active_holds = self
            .db
            .legal_holds()
            .active_holds_for_document(org_id, document_id)
            .await?;

        let can_be_deleted = active_holds.is_empty()
            && schedule.status == ScheduleStatus::Scheduled
            && schedule
                .delete_eligible_at
                .is_some_and(|deadline| deadline <= Utc::now());

        Ok(ComplianceState {
            document_id,
            status: schedule.status,
            delete_eligible_at: schedule.delete_eligible_at,
            active_holds,
            can_be_deleted,
        })
    }
}
