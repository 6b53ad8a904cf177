/*!
 * Scheduler Kernel
 *
 * Owns the process table and the three runtime continuations:
 * - boot: the caller of `boot`, resumed whenever a round dispatched nothing
 * - scheduler: rebuilt fresh before every entry, never resumed mid-way
 * - exit: primed once, entered by every process whose entry function returns
 *
 * Control flow never holds a Rust reference across a switch. Entry points
 * reached by a context switch or by SIGALRM find the kernel through the
 * thread-local `ACTIVE` pointer, set for the duration of `boot`.
 */

use super::atomic_stats::AtomicSchedulerStats;
use super::policy::Selector;
use super::preemption::{
    discard_pending, install_handler, preempt_mask, PreemptGuard, PreemptTimer,
};
use super::types::SchedulerStats;
use crate::context::{Continuation, ExecutionContext, Stack};
use crate::core::limits::KERNEL_STACK_SIZE;
use crate::core::types::{EntryFn, KernelResult, Pid};
use crate::core::{KernelError, RuntimeConfig};
use crate::ipc::Message;
use crate::process::{Process, ProcessState, ProcessTable};
use std::cell::Cell;
use std::ffi::{c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use tracing::{debug, error, info, trace};

thread_local! {
    static ACTIVE: Cell<*mut Kernel> = const { Cell::new(ptr::null_mut()) };
}

/// Kernel booted on this thread, if any
pub(crate) fn active() -> KernelResult<*mut Kernel> {
    let kernel = ACTIVE.with(Cell::get);
    if kernel.is_null() {
        Err(KernelError::NotRunning)
    } else {
        Ok(kernel)
    }
}

/// Scheduler state shared by the runtime handle and every process
pub struct Kernel {
    config: RuntimeConfig,
    table: ProcessTable,
    stats: AtomicSchedulerStats,
    selector: Selector,
    next_seq: u64,
    boot_ctx: Continuation,
    scheduler_ctx: Continuation,
    scheduler_stack: Stack,
    exit_ctx: Continuation,
    // Kept alive for exit_ctx
    _exit_stack: Stack,
    timer: Option<PreemptTimer>,
    fatal: Option<KernelError>,
}

impl Kernel {
    pub fn new(config: RuntimeConfig, selector: Selector) -> KernelResult<Self> {
        config.validate()?;

        let boot_ctx = Continuation::empty();
        let scheduler_stack = Stack::new(KERNEL_STACK_SIZE)?;
        let exit_stack = Stack::new(KERNEL_STACK_SIZE)?;
        let exit_ctx =
            Continuation::primed(process_exit, &exit_stack, Some(&boot_ctx), &preempt_mask())?;

        Ok(Self {
            table: ProcessTable::new(config.max_processes),
            config,
            stats: AtomicSchedulerStats::new(),
            selector,
            next_seq: 0,
            boot_ctx,
            scheduler_ctx: Continuation::empty(),
            scheduler_stack,
            exit_ctx,
            _exit_stack: exit_stack,
            timer: None,
            fatal: None,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats.snapshot()
    }

    /// Register a new process
    pub fn spawn(&mut self, name: Option<String>, entry: EntryFn) -> KernelResult<Pid> {
        let stack_size = self.config.stack_size;
        let exit_ctx = &self.exit_ctx;

        self.table.spawn_with(|pid| {
            let name = name.unwrap_or_else(|| format!("process-{}", pid));
            Process::new(pid, name, entry, stack_size, process_entry, exit_ctx)
        })
    }

    /// Append a copy of `data` to the mailbox of `dest`
    ///
    /// Dead destinations accept the message; it is never read. A blocked
    /// destination becomes runnable again.
    pub fn deliver(&mut self, from: Option<Pid>, dest: Pid, data: &[u8]) -> KernelResult<()> {
        let process = self.table.lookup_mut(dest)?;
        let seq = self.next_seq;

        process.deliver(Message::new(seq, from, data));
        if process.state() == ProcessState::Blocked {
            process.set_state(ProcessState::Runnable);
        }

        self.next_seq += 1;
        self.stats.inc_messages_sent();
        trace!(seq, dest = %dest, len = data.len(), "Message delivered");
        Ok(())
    }

    /// Dequeue the head of the running process's mailbox
    pub(crate) fn take_message(&mut self) -> KernelResult<Option<Message>> {
        let process = self.table.current_mut().ok_or(KernelError::NotRunning)?;
        let message = process.next_message();

        if message.is_some() {
            if process.state() == ProcessState::Blocked {
                process.set_state(ProcessState::Runnable);
            }
            self.stats.inc_messages_received();
        }
        Ok(message)
    }

    /// Mark the running process as waiting for a message
    pub(crate) fn block_current(&mut self) -> KernelResult<()> {
        let process = self.table.current_mut().ok_or(KernelError::NotRunning)?;
        process.set_state(ProcessState::Blocked);
        Ok(())
    }

    pub(crate) fn current_pid(&self) -> KernelResult<Pid> {
        self.table.current().ok_or(KernelError::NotRunning)
    }

    pub(crate) fn count_yield(&self) {
        self.stats.inc_yields();
    }

    /// Re-prime the scheduler continuation on its own stack
    ///
    /// SIGALRM is masked inside the scheduler and it falls back to the boot
    /// continuation when a round dispatches nothing. Allocation-free on
    /// success.
    fn rebuild_scheduler(&mut self) -> KernelResult<()> {
        self.scheduler_ctx.prime(
            scheduler_entry,
            &self.scheduler_stack,
            Some(&self.boot_ctx),
            &preempt_mask(),
        )
    }

    /// Save the running process and enter a fresh scheduler
    ///
    /// Returns once the scheduler dispatches the process again. The caller
    /// must have SIGALRM masked and hold no reference into the kernel.
    ///
    /// # Safety
    /// `kernel` must be the active kernel and a process must be running.
    pub(crate) unsafe fn suspend_current(kernel: *mut Kernel) -> KernelResult<()> {
        let save = (*kernel)
            .table
            .current_mut()
            .ok_or(KernelError::NotRunning)?
            .continuation_ptr();
        (*kernel).rebuild_scheduler()?;

        let target: *const Continuation = &(*kernel).scheduler_ctx;
        Continuation::capture_and_switch(save, target)
    }

    /// One scheduling decision
    ///
    /// Selecting a dead process is a no-op round: this returns and the
    /// scheduler continuation falls through to boot. Otherwise control moves
    /// into the process and only comes back here as an error.
    ///
    /// Runs with SIGALRM masked, possibly while a preempted process holds a
    /// lock, so nothing below may allocate or log.
    unsafe fn dispatch(kernel: *mut Kernel) -> KernelResult<()> {
        let count = (*kernel).table.len();
        let current = (*kernel).table.current_index();
        let Some(slot) = (*kernel).selector.select(count, current) else {
            return Ok(());
        };

        (*kernel).table.set_current(slot);
        let Some(process) = (*kernel).table.slot_mut(slot) else {
            return Ok(());
        };
        if process.is_dead() {
            (*kernel).stats.inc_idle_rounds();
            return Ok(());
        }

        process.record_dispatch();
        let target: *const Continuation = process.continuation_ptr();
        (*kernel).stats.inc_dispatches();

        discard_pending();
        if let Some(timer) = (*kernel).timer.as_mut() {
            timer.arm((*kernel).config.preempt_interval)?;
        }

        Err(Continuation::switch_to(target))
    }

    /// Run processes until none is left alive
    ///
    /// # Safety
    /// `kernel` must stay valid and otherwise unaliased until this returns.
    pub(crate) unsafe fn run(kernel: *mut Kernel) -> KernelResult<SchedulerStats> {
        if (*kernel).table.is_empty() {
            return Err(KernelError::NoProcesses);
        }
        if !ACTIVE.with(Cell::get).is_null() {
            return Err(KernelError::AlreadyBooted);
        }

        install_handler(on_preempt)?;
        let guard = PreemptGuard::new()?;
        discard_pending();
        (*kernel).timer = Some(PreemptTimer::for_current_thread()?);
        ACTIVE.with(|active| active.set(kernel));

        info!(
            processes = (*kernel).table.len(),
            interval_us = (*kernel).config.preempt_interval.as_micros() as u64,
            "Booting scheduler"
        );

        let outcome = loop {
            if let Some(err) = (*kernel).fatal.take() {
                break Err(err);
            }
            if (*kernel).table.live_count() == 0 {
                break Ok(());
            }

            (*kernel).stats.inc_rounds();
            if let Err(err) = (*kernel).rebuild_scheduler() {
                break Err(err);
            }

            let save: *mut Continuation = &mut (*kernel).boot_ctx;
            let target: *const Continuation = &(*kernel).scheduler_ctx;
            if let Err(err) = Continuation::capture_and_switch(save, target) {
                break Err(err);
            }
        };

        ACTIVE.with(|active| active.set(ptr::null_mut()));
        (*kernel).timer = None;
        discard_pending();
        drop(guard);

        let stats = (*kernel).stats.snapshot();
        match outcome {
            Ok(()) => {
                info!(
                    dispatches = stats.dispatches,
                    preemptions = stats.preemptions,
                    exits = stats.exits,
                    "All processes finished"
                );
                Ok(stats)
            }
            Err(err) => {
                error!(error = %err, "Scheduler stopped");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("config", &self.config)
            .field("processes", &self.table.len())
            .field("current", &self.table.current())
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

extern "C" fn scheduler_entry() {
    let Ok(kernel) = active() else {
        return;
    };
    // SAFETY: ACTIVE is only set while boot keeps the kernel alive
    unsafe {
        if let Err(err) = Kernel::dispatch(kernel) {
            (*kernel).fatal = Some(err);
        }
    }
}

/// SIGALRM handler: suspend the running process into a fresh scheduler
///
/// SIGALRM is blocked for the handler's duration, and the saved
/// continuation carries that mask. Resuming it returns through the handler,
/// whose sigreturn restores the process's own mask.
extern "C" fn on_preempt(_signal: c_int, _info: *mut libc::siginfo_t, _uctx: *mut c_void) {
    let Ok(kernel) = active() else {
        return;
    };
    // SAFETY: the signal is only unmasked while a process runs, and process
    // code holds no kernel reference outside masked sections
    unsafe {
        let Some(process) = (*kernel).table.current_mut() else {
            return;
        };
        if process.is_dead() {
            return;
        }
        let save = process.continuation_ptr();
        if (*kernel).rebuild_scheduler().is_err() {
            return;
        }

        (*kernel).stats.inc_preemptions();
        let target: *const Continuation = &(*kernel).scheduler_ctx;
        if let Err(err) = Continuation::capture_and_switch(save, target) {
            (*kernel).fatal = Some(err);
        }
    }
}

/// First code run on every process stack
extern "C" fn process_entry() {
    let entry = match PreemptGuard::new() {
        Ok(_guard) => active().ok().and_then(|kernel| {
            // SAFETY: masked, no other reference into the kernel is live
            unsafe { (*kernel).table.current_mut().and_then(Process::take_entry) }
        }),
        Err(_) => None,
    };

    let outcome = match entry {
        Some(entry) => panic::catch_unwind(AssertUnwindSafe(entry)),
        None => Ok(()),
    };

    // Stay masked until the exit continuation takes over
    if let Ok(guard) = PreemptGuard::new() {
        if let Ok(pid) = active().and_then(|kernel| unsafe { (*kernel).current_pid() }) {
            match outcome {
                Ok(()) => debug!(pid = %pid, "Process returned"),
                Err(_) => error!(pid = %pid, "Process panicked, marking dead"),
            }
        }
        guard.keep_blocked();
    }
}

/// Entered through `uc_link` whenever a process entry function returns
///
/// Runs on its own stack, so the dead process's stack can be unmapped here.
extern "C" fn process_exit() {
    let Ok(kernel) = active() else {
        return;
    };
    // SAFETY: masked via the continuation's mask; the exiting process's
    // frames are abandoned
    unsafe {
        if let Some(process) = (*kernel).table.current_mut() {
            drop(process.retire());
        }
        (*kernel).stats.inc_exits();

        if let Err(err) = (*kernel).rebuild_scheduler() {
            (*kernel).fatal = Some(err);
            return;
        }
        let target: *const Continuation = &(*kernel).scheduler_ctx;
        (*kernel).fatal = Some(Continuation::switch_to(target));
    }
}
