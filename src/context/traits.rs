/*!
 * Context Switch Traits
 * The two control-transfer operations every other layer is built on
 */

use crate::core::KernelError;

/// A resumable point of execution bound to its own stack
///
/// Scheduler dispatch, preemption and voluntary yield all reduce to a single
/// call of one of these two operations. Both take raw pointers: the source
/// and target usually live in the same owning structure, and the caller's
/// frame stays suspended while other code mutates that structure.
pub trait ExecutionContext {
    /// Save the caller's execution point into `save_into` and resume `switch_to`
    ///
    /// Returns `Ok(())` only when some later transfer resumes `save_into`.
    ///
    /// # Safety
    /// Both pointers must be valid for the duration of the switch, `switch_to`
    /// must be primed or previously captured, and no reference derived from
    /// either context may be held across the call.
    unsafe fn capture_and_switch(
        save_into: *mut Self,
        switch_to: *const Self,
    ) -> Result<(), KernelError>;

    /// Resume `target` without saving the caller
    ///
    /// Returns only when the transfer failed.
    ///
    /// # Safety
    /// `target` must be primed or previously captured. Everything on the
    /// caller's stack is abandoned without running destructors.
    unsafe fn switch_to(target: *const Self) -> KernelError;
}
