//! Background workers: the deletion sweep and the hold repair pass.

pub mod deletion_sweep;
pub mod hold_repair;

pub use deletion_sweep::{SweepRunResult, run_sweep, start_deletion_sweep_worker};
pub use hold_repair::{RepairRunResult, run_repair, start_hold_repair_worker};
