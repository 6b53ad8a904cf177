/*!
 * Scheduler Types
 * Statistics snapshots reported by the scheduler
 */

use serde::{Deserialize, Serialize};

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// Scheduler statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerStats {
    /// Times the scheduler continuation was entered from boot
    #[serde(skip_serializing_if = "is_zero", default)]
    pub rounds: u64,
    /// Control transfers into a process
    #[serde(skip_serializing_if = "is_zero", default)]
    pub dispatches: u64,
    /// Timer-driven suspensions
    #[serde(skip_serializing_if = "is_zero", default)]
    pub preemptions: u64,
    /// Voluntary suspensions
    #[serde(skip_serializing_if = "is_zero", default)]
    pub yields: u64,
    /// Selections that landed on a dead process
    #[serde(skip_serializing_if = "is_zero", default)]
    pub idle_rounds: u64,
    /// Processes whose entry function returned
    #[serde(skip_serializing_if = "is_zero", default)]
    pub exits: u64,
    #[serde(skip_serializing_if = "is_zero", default)]
    pub messages_sent: u64,
    #[serde(skip_serializing_if = "is_zero", default)]
    pub messages_received: u64,
}

impl SchedulerStats {
    /// Suspensions of either kind
    pub fn context_switches(&self) -> u64 {
        self.preemptions + self.yields + self.exits
    }
}
