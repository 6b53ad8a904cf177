/*!
 * Scheduler Module
 * Random selection, timer preemption and the runtime built on them
 */

pub mod api;
pub mod atomic_stats;
mod kernel;
pub mod policy;
pub mod preemption;
pub mod runtime;
pub mod types;

// Re-export public API
pub use api::{receive, receive_message, self_id, send, spawn, spawn_named, try_receive, yield_now};
pub use atomic_stats::AtomicSchedulerStats;
pub use policy::{pick_slot, Selector};
pub use preemption::{without_preemption, PreemptGuard};
pub use runtime::Runtime;
pub use types::SchedulerStats;
