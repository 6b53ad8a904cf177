/*!
 * Continuations
 * ucontext-backed saved execution state
 */

use super::stack::Stack;
use super::traits::ExecutionContext;
use crate::core::{KernelError, KernelResult};
use nix::sys::signal::SigSet;
use std::mem;
use std::ptr;

/// Saved register state, stack pointer and signal mask
///
/// The `ucontext_t` is boxed because glibc stores a pointer into the
/// structure itself (the floating-point save area); it must never move
/// once captured.
pub struct Continuation {
    ctx: Box<libc::ucontext_t>,
}

impl Continuation {
    /// Blank continuation, valid only as a `save_into` target
    pub fn empty() -> Self {
        // SAFETY: ucontext_t is plain old data; all-zero is a valid bit pattern
        Self {
            ctx: Box::new(unsafe { mem::zeroed() }),
        }
    }

    /// Continuation that starts `entry` on `stack` with no arguments
    pub fn primed(
        entry: extern "C" fn(),
        stack: &Stack,
        link: Option<&Continuation>,
        mask: &SigSet,
    ) -> KernelResult<Self> {
        let mut continuation = Self::empty();
        continuation.prime(entry, stack, link, mask)?;
        Ok(continuation)
    }

    /// Re-prime in place so the next resume starts `entry` afresh
    ///
    /// When `entry` returns, control continues at `link`; with no link the
    /// OS thread exits. Performs no heap allocation, so it is usable from
    /// the preemption handler.
    pub fn prime(
        &mut self,
        entry: extern "C" fn(),
        stack: &Stack,
        link: Option<&Continuation>,
        mask: &SigSet,
    ) -> KernelResult<()> {
        let ctx: *mut libc::ucontext_t = &mut *self.ctx;

        // SAFETY: ctx points at our boxed ucontext; stack outlives every
        // resume of this continuation (owners keep them side by side)
        unsafe {
            if libc::getcontext(ctx) == -1 {
                return Err(KernelError::ResourceExhausted(format!(
                    "getcontext: {}",
                    std::io::Error::last_os_error()
                )));
            }

            (*ctx).uc_stack.ss_sp = stack.bottom();
            (*ctx).uc_stack.ss_size = stack.usable_size();
            (*ctx).uc_stack.ss_flags = 0;
            (*ctx).uc_link = link.map_or(ptr::null_mut(), |l| l.as_ptr() as *mut _);
            (*ctx).uc_sigmask = *mask.as_ref();

            libc::makecontext(ctx, entry, 0);
        }

        Ok(())
    }

    pub(crate) fn as_ptr(&self) -> *const libc::ucontext_t {
        &*self.ctx
    }

    fn as_mut_ptr(&mut self) -> *mut libc::ucontext_t {
        &mut *self.ctx
    }
}

impl ExecutionContext for Continuation {
    unsafe fn capture_and_switch(
        save_into: *mut Self,
        switch_to: *const Self,
    ) -> Result<(), KernelError> {
        let from = (*save_into).as_mut_ptr();
        let to = (*switch_to).as_ptr();

        if libc::swapcontext(from, to) == -1 {
            return Err(KernelError::ContextSwitch(format!(
                "swapcontext: {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(())
    }

    unsafe fn switch_to(target: *const Self) -> KernelError {
        libc::setcontext((*target).as_ptr());
        KernelError::ContextSwitch(format!(
            "setcontext: {}",
            std::io::Error::last_os_error()
        ))
    }
}

impl std::fmt::Debug for Continuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Continuation")
            .field("stack", &self.ctx.uc_stack.ss_sp)
            .field("link", &self.ctx.uc_link)
            .finish()
    }
}
