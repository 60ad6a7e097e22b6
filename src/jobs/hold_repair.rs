//! Hold repair worker.
//!
//! Finds active holds whose scope-to-target materialization never completed
//! (crash or error during creation) and reruns it. Until repair succeeds the
//! hold stays active and cannot be released, so the failure mode is always
//! over-retention, never under-retention.

use tracing::{debug, error, info, instrument};

use crate::{config::HoldRepairConfig, services::Services};

/// Results from a single repair run.
#[derive(Debug, Default)]
pub struct RepairRunResult {
    /// Holds whose materialization completed this run.
    pub repaired: u64,
    /// Holds whose repair failed and will be retried next run.
    pub failed: u64,
}

/// Starts the hold repair worker as a background task.
pub async fn start_hold_repair_worker(services: Services, config: HoldRepairConfig) {
    if !config.enabled {
        info!("Hold repair worker disabled by configuration");
        return;
    }

    info!(
        interval_minutes = config.interval_minutes,
        "Starting hold repair worker"
    );

    let interval = std::time::Duration::from_secs(config.interval_minutes * 60);

    loop {
        match run_repair(&services).await {
            Ok(result) if result.repaired + result.failed > 0 => {
                info!(
                    repaired = result.repaired,
                    failed = result.failed,
                    "Hold repair run complete"
                );
            }
            Ok(_) => {
                debug!("Hold repair run complete, nothing to repair");
            }
            Err(e) => {
                error!(error = %e, "Error running hold repair");
            }
        }

        tokio::time::sleep(interval).await;
    }
}

/// Run a single repair pass over all tenants.
#[instrument(skip(services))]
pub async fn run_repair(
    services: &Services,
) -> Result<RepairRunResult, Box<dyn std::error::Error + Send + Sync>> {
    let mut result = RepairRunResult::default();

    let holds = services.db.legal_holds().list_unmaterialized_active().await?;

    for hold in holds {
        match services.legal_holds.repair_hold(hold.org_id, hold.id).await {
            Ok(_) => {
                info!(hold_id = %hold.id, "Hold materialization repaired");
                result.repaired += 1;
            }
            Err(e) => {
                error!(hold_id = %hold.id, error = %e, "Hold repair failed, will retry");
                result.failed += 1;
            }
        }
    }

    Ok(result)
}
