/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime error taxonomy
///
/// `ContextSwitch` is the only variant that is fatal to the whole runtime:
/// once a control transfer fails the scheduler's continuation can no longer
/// be trusted, so `boot` abandons the run and surfaces it.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum KernelError {
    #[error("Process table full: capacity {capacity}")]
    #[diagnostic(
        code(process::capacity_exceeded),
        help("Raise max_processes in RuntimeConfig; slots of dead processes are not reused.")
    )]
    CapacityExceeded { capacity: usize },

    #[error("Process {0} not found")]
    #[diagnostic(
        code(process::not_found),
        help("Identifiers are only handed out by spawn. Check where this PID came from.")
    )]
    ProcessNotFound(Pid),

    #[error("Resource allocation failed: {0}")]
    #[diagnostic(
        code(context::resource_exhausted),
        help("Stack mapping or context initialization failed. Check memory limits.")
    )]
    ResourceExhausted(String),

    #[error("Context switch failed: {0}")]
    #[diagnostic(
        code(scheduler::context_switch),
        help("The runtime cannot continue after a failed control transfer.")
    )]
    ContextSwitch(String),

    #[error("No runtime is executing on this thread")]
    #[diagnostic(
        code(scheduler::not_running),
        help("send/receive/self_id/yield_now may only be called from inside a booted process.")
    )]
    NotRunning,

    #[error("A runtime is already booted on this thread")]
    #[diagnostic(code(scheduler::already_booted))]
    AlreadyBooted,

    #[error("Cannot boot: the process table is empty")]
    #[diagnostic(code(scheduler::no_processes), help("Spawn at least one process before boot."))]
    NoProcesses,

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(runtime::invalid_config),
        help("Review max_processes, stack_size and preempt_interval.")
    )]
    InvalidConfig(String),
}

impl KernelError {
    /// Whether the runtime must stop after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, KernelError::ContextSwitch(_))
    }
}

impl From<nix::Error> for KernelError {
    fn from(err: nix::Error) -> Self {
        KernelError::ResourceExhausted(err.desc().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization_roundtrip() {
        let error = KernelError::CapacityExceeded { capacity: 10 };
        let json = serde_json::to_string(&error).unwrap();
        let deserialized: KernelError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            KernelError::ProcessNotFound(Pid(4)).to_string(),
            "Process 4 not found"
        );
        assert_eq!(
            KernelError::CapacityExceeded { capacity: 3 }.to_string(),
            "Process table full: capacity 3"
        );
    }

    #[test]
    fn test_only_context_switch_is_fatal() {
        assert!(KernelError::ContextSwitch("swapcontext".into()).is_fatal());
        assert!(!KernelError::NotRunning.is_fatal());
        assert!(!KernelError::ProcessNotFound(Pid(0)).is_fatal());
    }

    #[test]
    fn test_nix_error_maps_to_resource() {
        let err: KernelError = nix::Error::ENOMEM.into();
        assert!(matches!(err, KernelError::ResourceExhausted(_)));
    }
}
