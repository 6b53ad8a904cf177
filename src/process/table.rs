/*!
 * Process Table
 * Fixed-capacity arena of process records
 */

use super::record::Process;
use super::types::{ProcessInfo, ProcessState};
use crate::core::types::{KernelResult, Pid};
use crate::core::KernelError;
use tracing::info;

/// Insertion-ordered, fixed-capacity process table
///
/// Identifiers are handed out densely from zero and never reused, so the
/// PID of a process is also its slot. Storage is reserved up front: adding
/// a process never reallocates.
pub struct ProcessTable {
    processes: Vec<Process>,
    capacity: usize,
    current: Option<usize>,
}

impl ProcessTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            processes: Vec::with_capacity(capacity),
            capacity,
            current: None,
        }
    }

    /// Register a process built by `build` under the next identifier
    ///
    /// Fails with `CapacityExceeded` before calling `build` when the table is
    /// full, so a failed spawn leaves the table untouched.
    pub fn spawn_with<F>(&mut self, build: F) -> KernelResult<Pid>
    where
        F: FnOnce(Pid) -> KernelResult<Process>,
    {
        if self.is_full() {
            return Err(KernelError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let pid = Pid(self.processes.len() as u32);
        let mut process = build(pid)?;
        process.set_state(ProcessState::Runnable);

        info!(pid = %pid, name = process.name(), slot = pid.slot(), "Process spawned");
        self.processes.push(process);
        Ok(pid)
    }

    pub fn lookup(&self, pid: Pid) -> KernelResult<&Process> {
        self.processes
            .get(pid.slot())
            .ok_or(KernelError::ProcessNotFound(pid))
    }

    pub fn lookup_mut(&mut self, pid: Pid) -> KernelResult<&mut Process> {
        self.processes
            .get_mut(pid.slot())
            .ok_or(KernelError::ProcessNotFound(pid))
    }

    /// Slot of a registered process
    pub fn index_of(&self, pid: Pid) -> Option<usize> {
        (pid.slot() < self.processes.len()).then_some(pid.slot())
    }

    pub fn slot(&self, index: usize) -> Option<&Process> {
        self.processes.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Process> {
        self.processes.get_mut(index)
    }

    /// Most recently dispatched process
    pub fn current(&self) -> Option<Pid> {
        self.current.map(|slot| self.processes[slot].pid())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_mut(&mut self) -> Option<&mut Process> {
        let slot = self.current?;
        self.processes.get_mut(slot)
    }

    pub(crate) fn set_current(&mut self, slot: usize) {
        debug_assert!(slot < self.processes.len());
        self.current = Some(slot);
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.processes.len() >= self.capacity
    }

    /// Processes that have not yet terminated
    pub fn live_count(&self) -> usize {
        self.processes.iter().filter(|p| !p.is_dead()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    pub fn infos(&self) -> Vec<ProcessInfo> {
        self.processes.iter().map(Process::info).collect()
    }
}
