/*!
 * Green Kernel Library
 *
 * User-space green threads on a single OS thread: guarded stacks and
 * ucontext continuations, a fixed-capacity process table, a random
 * scheduler preempted by a per-thread SIGALRM timer, and per-process
 * FIFO mailboxes with blocking receive.
 */

pub mod context;
pub mod core;
pub mod ipc;
pub mod monitoring;
pub mod process;
pub mod scheduler;

// Re-exports
pub use crate::core::{KernelError, KernelResult, Pid, RuntimeConfig};
pub use ipc::Message;
pub use monitoring::init_tracing;
pub use process::{ProcessInfo, ProcessState};
pub use scheduler::{
    receive, receive_message, self_id, send, spawn, spawn_named, try_receive, without_preemption,
    yield_now, Runtime, SchedulerStats,
};
