/*!
 * Lock-Free Scheduler Statistics
 * Atomic counters, safe to bump from the preemption handler
 */

use super::types::SchedulerStats;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic scheduler statistics
///
/// All operations use relaxed ordering: only one flow of control ever
/// touches them, atomics are needed because the SIGALRM handler may
/// interrupt a plain read-modify-write.
#[derive(Debug, Default)]
pub struct AtomicSchedulerStats {
    rounds: AtomicU64,
    dispatches: AtomicU64,
    preemptions: AtomicU64,
    yields: AtomicU64,
    idle_rounds: AtomicU64,
    exits: AtomicU64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
}

impl AtomicSchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn inc_rounds(&self) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_dispatches(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_preemptions(&self) {
        self.preemptions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_yields(&self) {
        self.yields.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_idle_rounds(&self) {
        self.idle_rounds.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_exits(&self) {
        self.exits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_messages_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_messages_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            rounds: self.rounds.load(Ordering::Relaxed),
            dispatches: self.dispatches.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            yields: self.yields.load(Ordering::Relaxed),
            idle_rounds: self.idle_rounds.load(Ordering::Relaxed),
            exits: self.exits.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = AtomicSchedulerStats::new();
        stats.inc_dispatches();
        stats.inc_dispatches();
        stats.inc_preemptions();
        stats.inc_yields();
        stats.inc_exits();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.dispatches, 2);
        assert_eq!(snapshot.context_switches(), 3);
        assert_eq!(snapshot.idle_rounds, 0);
    }

    #[test]
    fn test_zero_counters_are_omitted_from_json() {
        let stats = AtomicSchedulerStats::new();
        stats.inc_rounds();
        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json, serde_json::json!({ "rounds": 1 }));
    }
}
