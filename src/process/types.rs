/*!
 * Process Types
 * Lifecycle states and introspection snapshots
 */

use crate::core::types::Pid;
use serde::{Deserialize, Serialize};

/// Process state
///
/// `New -> Runnable -> (Blocked <-> Runnable) -> Dead`. `Dead` is terminal.
/// `Blocked` is informational: a process waiting in `receive` stays
/// selectable and simply yields again while its mailbox is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Built, not yet registered with the table
    New,
    /// Eligible for dispatch (including the one currently running)
    Runnable,
    /// Waiting in `receive` on an empty mailbox
    Blocked,
    /// Entry function returned; stack released, slot and PID retained
    Dead,
}

impl ProcessState {
    #[inline(always)]
    pub const fn is_dead(self) -> bool {
        matches!(self, ProcessState::Dead)
    }

    /// Whether the lifecycle permits moving to `to`
    pub const fn can_transition(self, to: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, to),
            (New, Runnable)
                | (Runnable, Blocked)
                | (Blocked, Runnable)
                | (Runnable, Runnable)
                | (Blocked, Blocked)
                | (Runnable, Dead)
                | (Blocked, Dead)
        )
    }
}

/// Process metadata snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub name: String,
    pub state: ProcessState,
    /// Times the scheduler transferred control into this process
    pub dispatches: u64,
    /// Messages waiting in the mailbox
    pub pending_messages: usize,
    /// Messages this process has received
    pub received_messages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_is_terminal() {
        for to in [
            ProcessState::New,
            ProcessState::Runnable,
            ProcessState::Blocked,
            ProcessState::Dead,
        ] {
            assert!(!ProcessState::Dead.can_transition(to));
        }
    }

    #[test]
    fn test_lifecycle_path() {
        assert!(ProcessState::New.can_transition(ProcessState::Runnable));
        assert!(ProcessState::Runnable.can_transition(ProcessState::Blocked));
        assert!(ProcessState::Blocked.can_transition(ProcessState::Runnable));
        assert!(ProcessState::Runnable.can_transition(ProcessState::Dead));
        assert!(!ProcessState::New.can_transition(ProcessState::Dead));
    }

    #[test]
    fn test_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ProcessState::Runnable).unwrap(),
            "\"runnable\""
        );
    }
}
