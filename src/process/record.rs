/*!
 * Process Record
 * One green process: stack, continuation, mailbox and lifecycle state
 */

use super::types::{ProcessInfo, ProcessState};
use crate::context::{Continuation, Stack};
use crate::core::types::{EntryFn, KernelResult, Pid};
use crate::ipc::{Mailbox, Message};
use nix::sys::signal::SigSet;
use tracing::debug;

/// Green process
pub struct Process {
    pid: Pid,
    name: String,
    state: ProcessState,
    entry: Option<EntryFn>,
    stack: Option<Stack>,
    continuation: Continuation,
    mailbox: Mailbox,
    dispatches: u64,
}

impl Process {
    /// Build a `New` process whose first resume runs `trampoline`
    ///
    /// The trampoline is expected to take the entry function back out via
    /// [`Process::take_entry`]. On return control falls through to
    /// `on_exit` instead of off the end of the stack.
    pub fn new(
        pid: Pid,
        name: String,
        entry: EntryFn,
        stack_size: usize,
        trampoline: extern "C" fn(),
        on_exit: &Continuation,
    ) -> KernelResult<Self> {
        let stack = Stack::new(stack_size)?;
        let continuation = Continuation::primed(trampoline, &stack, Some(on_exit), &SigSet::empty())?;

        debug!(pid = %pid, name = %name, stack = stack.usable_size(), "Process created");

        Ok(Self {
            pid,
            name,
            state: ProcessState::New,
            entry: Some(entry),
            stack: Some(stack),
            continuation,
            mailbox: Mailbox::new(),
            dispatches: 0,
        })
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state.is_dead()
    }

    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    /// Move to `to` if the lifecycle allows it
    pub fn set_state(&mut self, to: ProcessState) -> bool {
        if self.state.can_transition(to) {
            self.state = to;
            true
        } else {
            false
        }
    }

    pub(crate) fn take_entry(&mut self) -> Option<EntryFn> {
        self.entry.take()
    }

    pub(crate) fn record_dispatch(&mut self) {
        self.dispatches += 1;
    }

    pub(crate) fn continuation_ptr(&mut self) -> *mut Continuation {
        &mut self.continuation
    }

    /// Mark `Dead` and hand back the stack for release
    ///
    /// The caller must not be running on the returned stack.
    pub(crate) fn retire(&mut self) -> Option<Stack> {
        self.state = ProcessState::Dead;
        self.entry = None;
        self.stack.take()
    }

    pub fn has_stack(&self) -> bool {
        self.stack.is_some()
    }

    pub fn deliver(&mut self, message: Message) {
        self.mailbox.push(message);
    }

    pub fn next_message(&mut self) -> Option<Message> {
        self.mailbox.pop()
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            pid: self.pid,
            name: self.name.clone(),
            state: self.state,
            dispatches: self.dispatches,
            pending_messages: self.mailbox.len(),
            received_messages: self.mailbox.delivered(),
        }
    }
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("dispatches", &self.dispatches)
            .field("mailbox", &self.mailbox.len())
            .finish()
    }
}
