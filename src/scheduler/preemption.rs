/*!
 * Preemption
 *
 * SIGALRM wiring: a per-thread one-shot timer rearmed on every dispatch,
 * the handler installation, and the critical-section guard that keeps the
 * signal out while runtime state is being mutated.
 */

use crate::core::KernelResult;
use nix::sys::signal::{
    pthread_sigmask, sigaction, SaFlags, SigAction, SigEvent, SigHandler, SigSet, SigevNotify,
    SigmaskHow, Signal,
};
use nix::sys::time::TimeSpec;
use nix::sys::timer::{Expiration, Timer, TimerSetTimeFlags};
use nix::time::ClockId;
use nix::unistd::gettid;
use std::ffi::{c_int, c_void};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Signal used for preemption
pub const PREEMPT_SIGNAL: Signal = Signal::SIGALRM;

static HANDLER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Signal handler signature accepted by [`install_handler`]
pub type PreemptHandler = extern "C" fn(c_int, *mut libc::siginfo_t, *mut c_void);

/// Mask containing only the preemption signal
#[inline]
pub fn preempt_mask() -> SigSet {
    let mut mask = SigSet::empty();
    mask.add(PREEMPT_SIGNAL);
    mask
}

/// Install `handler` for SIGALRM once per OS process
///
/// The disposition is process-wide and left in place; the handler is
/// expected to do nothing on threads without a booted runtime. The signal
/// stays blocked for the handler's own duration.
pub fn install_handler(handler: PreemptHandler) -> KernelResult<()> {
    if HANDLER_INSTALLED.load(Ordering::Acquire) {
        return Ok(());
    }

    let action = SigAction::new(
        SigHandler::SigAction(handler),
        SaFlags::SA_RESTART | SaFlags::SA_SIGINFO,
        preempt_mask(),
    );

    // SAFETY: the handler only touches thread-local state and
    // allocation-free runtime paths
    unsafe { sigaction(PREEMPT_SIGNAL, &action) }?;
    HANDLER_INSTALLED.store(true, Ordering::Release);
    Ok(())
}

/// Drop any SIGALRM already pending for this thread
///
/// The signal must be blocked when this is called.
pub fn discard_pending() {
    let mask = preempt_mask();
    let zero = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: valid mask and timeout, no siginfo requested
    unsafe { while libc::sigtimedwait(mask.as_ref(), ptr::null_mut(), &zero) > 0 {} }
}

/// Critical section with preemption masked
///
/// Restores the previous disposition of SIGALRM only, so guards nest and
/// survive a context switch taken while held.
#[must_use = "preemption is re-enabled as soon as the guard is dropped"]
pub struct PreemptGuard {
    was_blocked: bool,
}

impl PreemptGuard {
    pub fn new() -> KernelResult<Self> {
        let mut previous = SigSet::empty();
        pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&preempt_mask()), Some(&mut previous))?;
        Ok(Self {
            was_blocked: previous.contains(PREEMPT_SIGNAL),
        })
    }

    /// Leave preemption masked after the guard is gone
    pub fn keep_blocked(mut self) {
        self.was_blocked = true;
    }
}

impl Drop for PreemptGuard {
    fn drop(&mut self) {
        if !self.was_blocked {
            let _ = preempt_mask().thread_unblock();
        }
    }
}

/// Run `f` with preemption masked
///
/// Processes that print, lock, or allocate heavily should do it in here:
/// a process preempted while holding such a resource leaves it held while
/// the others run on the same OS thread.
pub fn without_preemption<T>(f: impl FnOnce() -> T) -> KernelResult<T> {
    let _guard = PreemptGuard::new()?;
    Ok(f())
}

/// One-shot POSIX timer delivering SIGALRM to the creating thread only
pub struct PreemptTimer {
    timer: Timer,
}

impl PreemptTimer {
    pub fn for_current_thread() -> KernelResult<Self> {
        let event = SigEvent::new(SigevNotify::SigevThreadId {
            signal: PREEMPT_SIGNAL,
            thread_id: gettid().as_raw(),
            si_value: 0,
        });
        let timer = Timer::new(ClockId::CLOCK_MONOTONIC, event)?;
        Ok(Self { timer })
    }

    /// Fire once after `interval`, replacing any earlier deadline
    pub fn arm(&mut self, interval: Duration) -> KernelResult<()> {
        self.timer.set(
            Expiration::OneShot(TimeSpec::from_duration(interval)),
            TimerSetTimeFlags::empty(),
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for PreemptTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreemptTimer").finish_non_exhaustive()
    }
}
