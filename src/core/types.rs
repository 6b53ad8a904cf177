/*!
 * Core Types
 * Common types used across the runtime
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process identifier
///
/// Assigned densely from zero in spawn order and never rebound within a
/// runtime, so a `Pid` doubles as the process's table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub u32);

impl Pid {
    /// Table slot backing this identifier
    #[inline(always)]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Pid> for u32 {
    fn from(pid: Pid) -> Self {
        pid.0
    }
}

/// Body of a green process, consumed on its first dispatch
pub type EntryFn = Box<dyn FnOnce() + 'static>;

/// Common result type for runtime operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_display_and_slot() {
        let pid = Pid(7);
        assert_eq!(pid.to_string(), "7");
        assert_eq!(pid.slot(), 7);
        assert_eq!(u32::from(pid), 7);
    }

    #[test]
    fn test_pid_serializes_transparently() {
        let json = serde_json::to_string(&Pid(3)).unwrap();
        assert_eq!(json, "3");
        let back: Pid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Pid(3));
    }
}
