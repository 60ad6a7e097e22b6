//! Deletion sweep worker.
//!
//! Periodically finds schedules whose deadline has passed, re-verifies that
//! no active hold protects the document, and executes the deletion:
//! tombstone first, then content, then the status flip. A crash at any point
//! leaves the system rerunnable without losing evidence.

use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::SweepConfig,
    models::{RetentionSchedule, ScheduleStatus, Tombstone},
    services::{
        Services,
        audit_events::{events, system_event},
    },
};

/// Results from a single sweep run.
#[derive(Debug, Default)]
pub struct SweepRunResult {
    /// Documents whose content was destroyed and tombstoned.
    pub deleted: u64,
    /// Candidates skipped because an active hold still protects them.
    pub skipped_held: u64,
    /// Candidates that failed and will be retried next run.
    pub failed: u64,
}

impl SweepRunResult {
    pub fn has_activity(&self) -> bool {
        self.deleted + self.skipped_held + self.failed > 0
    }
}

/// Starts the deletion sweep as a background task.
///
/// The worker runs in a loop at the configured interval until the task is
/// cancelled at shutdown.
pub async fn start_deletion_sweep_worker(services: Services, config: SweepConfig) {
    if !config.enabled {
        info!("Deletion sweep disabled by configuration");
        return;
    }

    let dry_run_msg = if config.dry_run { " (DRY RUN)" } else { "" };
    info!(
        interval_hours = config.interval_hours,
        batch_size = config.batch_size,
        max_deletes_per_run = config.max_deletes_per_run,
        dry_run = config.dry_run,
        "Starting deletion sweep worker{}",
        dry_run_msg
    );

    let interval = std::time::Duration::from_secs(config.interval_hours * 3600);

    loop {
        match run_sweep(&services, &config).await {
            Ok(result) => {
                if result.has_activity() {
                    info!(
                        deleted = result.deleted,
                        skipped_held = result.skipped_held,
                        failed = result.failed,
                        dry_run = config.dry_run,
                        "Sweep run complete{}",
                        dry_run_msg
                    );
                } else {
                    debug!("Sweep run complete, no eligible documents");
                }
            }
            Err(e) => {
                error!(error = %e, "Error running deletion sweep");
            }
        }

        tokio::time::sleep(interval).await;
    }
}

/// Run a single sweep pass over all tenants.
#[instrument(skip(services, config))]
pub async fn run_sweep(
    services: &Services,
    config: &SweepConfig,
) -> Result<SweepRunResult, Box<dyn std::error::Error + Send + Sync>> {
    let mut result = SweepRunResult::default();
    let now = Utc::now();

    let candidates = services
        .db
        .schedules()
        .list_delete_eligible(now, config.batch_size)
        .await?;

    for schedule in candidates {
        if result.deleted >= config.max_deletes_per_run as u64 {
            warn!(
                max = config.max_deletes_per_run,
                "Sweep delete cap reached, remaining candidates wait for next run"
            );
            break;
        }

        match sweep_one(services, config, &schedule).await {
            Ok(SweepOutcome::Deleted) => result.deleted += 1,
            Ok(SweepOutcome::SkippedHeld) => result.skipped_held += 1,
            Ok(SweepOutcome::Noop) => {}
            Err(e) => {
                error!(
                    document_id = %schedule.document_id,
                    error = %e,
                    "Failed to delete document, will retry next run"
                );
                result.failed += 1;
            }
        }
    }

    Ok(result)
}

enum SweepOutcome {
    Deleted,
    SkippedHeld,
    Noop,
}

/// Execute deletion for one eligible schedule.
///
/// Eligibility was computed when the batch was fetched; the hold check runs
/// again here so a hold created between fetch and execution still protects
/// the document. Order of effects: tombstone, content, status. Rerunning
/// after a crash at any step converges on the same final state.
async fn sweep_one(
    services: &Services,
    config: &SweepConfig,
    schedule: &RetentionSchedule,
) -> Result<SweepOutcome, Box<dyn std::error::Error + Send + Sync>> {
    let org_id = schedule.org_id;
    let document_id = schedule.document_id;

    let active_holds = services
        .db
        .legal_holds()
        .count_active_targets(org_id, document_id)
        .await?;
    if active_holds > 0 {
        // A hold arriving between batch fetch and execution is expected.
        info!(
            document_id = %document_id,
            active_holds, "Eligible document is held, skipping"
        );
        let paused = services
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
            // The hold pipeline was interrupted before it paused the
            // schedule; that one is anomalous.
            warn!(
                document_id = %document_id,
                "Held document was still scheduled, paused by sweep"
            );
        }
        return Ok(SweepOutcome::SkippedHeld);
    }

    if config.dry_run {
        info!(
            document_id = %document_id,
            delete_eligible_at = ?schedule.delete_eligible_at,
            "DRY RUN: would delete document"
        );
        return Ok(SweepOutcome::Noop);
    }

    let document = match services.db.documents().get_by_id(org_id, document_id).await? {
        Some(document) => document,
        None => {
            warn!(document_id = %document_id, "Schedule references a missing document");
            return Ok(SweepOutcome::Noop);
        }
    };

    // Tombstone before destroying anything: if we crash after this point a
    // rerun sees the marker and finishes the job.
    services
        .db
        .tombstones()
        .insert(Tombstone {
            org_id,
            document_id,
            policy_id: schedule.policy_id,
            deleted_at: Utc::now(),
            actor: "system".to_string(),
        })
        .await?;

    if let Some(content_path) = &document.content_path {
        services.file_storage.delete(content_path).await?;
        services
            .db
            .documents()
            .clear_content_path(org_id, document_id)
            .await?;
    }

    let flipped = services
        .db
        .schedules()
        .transition_status(
            org_id,
            schedule.id,
            ScheduleStatus::Scheduled,
            ScheduleStatus::Deleted,
        )
        .await?;
    if !flipped {
        // Another sweep worker finished this document first.
        debug!(document_id = %document_id, "Schedule already moved on, skipping status flip");
        return Ok(SweepOutcome::Noop);
    }

    services
        .audit_events
        .record(
            org_id,
            system_event(
                events::RETENTION_EXECUTED,
                "schedule",
                schedule.id,
                json!({
                    "document_id": document_id,
                    "policy_id": schedule.policy_id,
                    "delete_eligible_at": schedule.delete_eligible_at,
                }),
                Some(format!("retention.executed:{}", document_id)),
            ),
        )
        .await;
    services
        .audit_events
        .record(
            org_id,
            system_event(
                events::DOCUMENT_DELETED,
                "document",
                document_id,
                json!({"category": document.category}),
                Some(format!("document.deleted:{}", document_id)),
            ),
        )
        .await;

    info!(document_id = %document_id, "Document content deleted and tombstoned");
    Ok(SweepOutcome::Deleted)
}
