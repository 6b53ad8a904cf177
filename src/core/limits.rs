/*!
 * System Limits and Constants
 *
 * Defaults and bounds for the process table, process stacks and the
 * preemption timer. Grouped by domain.
 */

use std::time::Duration;

// =============================================================================
// PROCESS TABLE
// =============================================================================

/// Default process table capacity
pub const DEFAULT_MAX_PROCESSES: usize = 10;

/// Upper bound accepted for `max_processes`
/// The table reserves `max_processes` slots up front
pub const MAX_PROCESSES_LIMIT: usize = 4096;

// =============================================================================
// STACKS
// =============================================================================

/// Default process stack size (256KB)
/// Rust frames plus formatting machinery need more than the classic 64KB
pub const DEFAULT_STACK_SIZE: usize = 256 * 1024;

/// Smallest usable stack (16KB)
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Largest accepted stack (64MB)
pub const MAX_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Stack for the scheduler and process-end continuations (64KB)
pub const KERNEL_STACK_SIZE: usize = 64 * 1024;

/// Page size assumed when the platform query fails
pub const FALLBACK_PAGE_SIZE: usize = 4096;

// =============================================================================
// PREEMPTION
// =============================================================================

/// Default preemption interval (1ms)
pub const DEFAULT_PREEMPT_INTERVAL: Duration = Duration::from_millis(1);

/// Shortest accepted interval (100us)
/// Below this the scheduler spends most of its time switching
pub const MIN_PREEMPT_INTERVAL: Duration = Duration::from_micros(100);

/// Longest accepted interval (1s)
pub const MAX_PREEMPT_INTERVAL: Duration = Duration::from_secs(1);
