/*!
 * Process-Side API
 *
 * Calls available to code running inside a green process. Each one masks
 * SIGALRM while it touches the kernel, so a process is never preempted
 * halfway through a mailbox or table update. Outside a booted runtime they
 * fail with `NotRunning`.
 */

use super::kernel::{active, Kernel};
use super::preemption::PreemptGuard;
use crate::core::types::{KernelResult, Pid};
use crate::ipc::Message;

/// Run `f` against the active kernel with preemption masked
fn with_kernel<T>(f: impl FnOnce(&mut Kernel) -> KernelResult<T>) -> KernelResult<T> {
    let _guard = PreemptGuard::new()?;
    let kernel = active()?;
    // SAFETY: masked, and no process holds a kernel reference across calls
    unsafe { f(&mut *kernel) }
}

/// Identifier of the calling process
pub fn self_id() -> KernelResult<Pid> {
    with_kernel(|kernel| kernel.current_pid())
}

/// Copy `data` into the mailbox of `dest`
///
/// Never blocks and never enters the scheduler. Sending to a process that
/// has already finished succeeds; the message is simply never read.
pub fn send(dest: Pid, data: &[u8]) -> KernelResult<()> {
    with_kernel(|kernel| {
        let from = kernel.current_pid()?;
        kernel.deliver(Some(from), dest, data)
    })
}

/// Block until a message arrives, then return its payload
///
/// There is no timeout: a process whose mailbox stays empty forever never
/// returns from this call.
pub fn receive() -> KernelResult<Vec<u8>> {
    receive_message().map(Message::into_payload)
}

/// Like [`receive`], keeping the sender and sequence number
pub fn receive_message() -> KernelResult<Message> {
    loop {
        let _guard = PreemptGuard::new()?;
        let kernel = active()?;

        // SAFETY: masked; the borrow ends before the switch below
        let message = unsafe { (*kernel).take_message()? };
        if let Some(message) = message {
            return Ok(message);
        }

        // SAFETY: as above
        unsafe {
            (*kernel).block_current()?;
            (*kernel).count_yield();
            Kernel::suspend_current(kernel)?;
        }
    }
}

/// Dequeue a message if one is waiting
pub fn try_receive() -> KernelResult<Option<Vec<u8>>> {
    with_kernel(|kernel| Ok(kernel.take_message()?.map(Message::into_payload)))
}

/// Give up the rest of the time slice
pub fn yield_now() -> KernelResult<()> {
    let _guard = PreemptGuard::new()?;
    let kernel = active()?;

    // SAFETY: masked, nothing borrowed from the kernel
    unsafe {
        (*kernel).count_yield();
        Kernel::suspend_current(kernel)
    }
}

/// Start another process from inside a running one
pub fn spawn<F>(f: F) -> KernelResult<Pid>
where
    F: FnOnce() + 'static,
{
    with_kernel(|kernel| kernel.spawn(None, Box::new(f)))
}

pub fn spawn_named<F>(name: impl Into<String>, f: F) -> KernelResult<Pid>
where
    F: FnOnce() + 'static,
{
    with_kernel(|kernel| kernel.spawn(Some(name.into()), Box::new(f)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::KernelError;

    #[test]
    fn test_calls_outside_runtime_fail() {
        assert_eq!(self_id().unwrap_err(), KernelError::NotRunning);
        assert_eq!(send(Pid(0), b"x").unwrap_err(), KernelError::NotRunning);
        assert_eq!(try_receive().unwrap_err(), KernelError::NotRunning);
        assert_eq!(yield_now().unwrap_err(), KernelError::NotRunning);
        assert_eq!(receive().unwrap_err(), KernelError::NotRunning);
        assert_eq!(spawn(|| {}).unwrap_err(), KernelError::NotRunning);
    }
}
