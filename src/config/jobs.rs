use serde::{Deserialize, Serialize};

/// Background job configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    /// Deletion sweep settings.
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Hold repair settings.
    #[serde(default)]
    pub hold_repair: HoldRepairConfig,
}

/// Deletion sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Run the sweep worker.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hours between sweep runs.
    #[serde(default = "default_sweep_interval")]
    pub interval_hours: u64,

    /// Eligible schedules fetched per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Upper bound on deletions per run; excess candidates wait for the
    /// next run.
    #[serde(default = "default_max_deletes")]
    pub max_deletes_per_run: u32,

    /// Log what would be deleted without deleting anything.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: default_sweep_interval(),
            batch_size: default_batch_size(),
            max_deletes_per_run: default_max_deletes(),
            dry_run: false,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.interval_hours == 0 {
            return Err("jobs.sweep.interval_hours must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return Err("jobs.sweep.batch_size must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Hold repair configuration. The repair pass finishes scope
/// materialization for holds whose creation was interrupted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HoldRepairConfig {
    /// Run the repair worker.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minutes between repair runs.
    #[serde(default = "default_repair_interval")]
    pub interval_minutes: u64,
}

impl Default for HoldRepairConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: default_repair_interval(),
        }
    }
}

impl HoldRepairConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.interval_minutes == 0 {
            return Err("jobs.hold_repair.interval_minutes must be at least 1".to_string());
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    24
}

fn default_batch_size() -> u32 {
    100
}

fn default_max_deletes() -> u32 {
    1000
}

fn default_repair_interval() -> u64 {
    15
}
