/*!
 * Runtime Handle
 * Owner-side entry point: configure, spawn, seed mailboxes, boot
 */

use super::kernel::Kernel;
use super::policy::Selector;
use super::types::SchedulerStats;
use crate::core::types::{KernelResult, Pid};
use crate::core::RuntimeConfig;
use crate::process::{Process, ProcessInfo, ProcessState};
use tracing::info;

/// Green-thread runtime bound to the OS thread that boots it
///
/// The kernel is boxed so its address stays fixed while processes and the
/// signal handler reach it through a raw pointer.
#[derive(Debug)]
pub struct Runtime {
    kernel: Box<Kernel>,
}

impl Runtime {
    /// Runtime whose selection RNG is seeded from OS entropy
    pub fn new(config: RuntimeConfig) -> KernelResult<Self> {
        Self::with_selector(config, Selector::from_entropy())
    }

    /// Runtime with a reproducible selection sequence
    pub fn with_seed(config: RuntimeConfig, seed: u64) -> KernelResult<Self> {
        Self::with_selector(config, Selector::seeded(seed))
    }

    fn with_selector(config: RuntimeConfig, selector: Selector) -> KernelResult<Self> {
        let kernel = Box::new(Kernel::new(config, selector)?);
        info!(
            max_processes = config.max_processes,
            stack_size = config.stack_size,
            "Runtime created"
        );
        Ok(Self { kernel })
    }

    /// Register a process; it first runs once `boot` is entered
    pub fn spawn<F>(&mut self, f: F) -> KernelResult<Pid>
    where
        F: FnOnce() + 'static,
    {
        self.kernel.spawn(None, Box::new(f))
    }

    pub fn spawn_named<F>(&mut self, name: impl Into<String>, f: F) -> KernelResult<Pid>
    where
        F: FnOnce() + 'static,
    {
        self.kernel.spawn(Some(name.into()), Box::new(f))
    }

    /// Enqueue a message before boot; it carries no sender
    pub fn send(&mut self, dest: Pid, data: &[u8]) -> KernelResult<()> {
        self.kernel.deliver(None, dest, data)
    }

    /// Hand this OS thread to the scheduler
    ///
    /// Returns only once every process is dead, or on a fatal context switch
    /// failure. A process blocked forever in `receive` keeps it from
    /// returning.
    pub fn boot(&mut self) -> KernelResult<SchedulerStats> {
        let kernel: *mut Kernel = &mut *self.kernel;
        // SAFETY: `self` is mutably borrowed for the whole run, so the boxed
        // kernel is reached only through this pointer until it returns
        unsafe { Kernel::run(kernel) }
    }

    pub fn lookup(&self, pid: Pid) -> KernelResult<&Process> {
        self.kernel.table().lookup(pid)
    }

    pub fn index_of(&self, pid: Pid) -> Option<usize> {
        self.kernel.table().index_of(pid)
    }

    /// Process most recently dispatched
    pub fn current(&self) -> Option<Pid> {
        self.kernel.table().current()
    }

    pub fn state(&self, pid: Pid) -> KernelResult<ProcessState> {
        self.lookup(pid).map(Process::state)
    }

    pub fn processes(&self) -> Vec<ProcessInfo> {
        self.kernel.table().infos()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.kernel.stats()
    }

    pub fn config(&self) -> &RuntimeConfig {
        self.kernel.config()
    }

    pub fn len(&self) -> usize {
        self.kernel.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernel.table().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::KernelError;

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RuntimeConfig::new().with_max_processes(0);
        assert!(matches!(
            Runtime::new(config),
            Err(KernelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_boot_without_processes_fails() {
        let mut runtime = Runtime::with_seed(RuntimeConfig::default(), 1).unwrap();
        assert_eq!(runtime.boot().unwrap_err(), KernelError::NoProcesses);
    }

    #[test]
    fn test_pre_boot_send_is_queued() {
        let mut runtime = Runtime::with_seed(RuntimeConfig::default(), 1).unwrap();
        let pid = runtime.spawn_named("sink", || {}).unwrap();
        runtime.send(pid, b"hello").unwrap();

        let info = &runtime.processes()[0];
        assert_eq!(info.name, "sink");
        assert_eq!(info.pending_messages, 1);
        assert_eq!(info.state, ProcessState::Runnable);
        assert_eq!(runtime.current(), None);
    }
}
