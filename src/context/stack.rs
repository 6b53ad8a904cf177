/*!
 * Process Stacks
 * Anonymous mappings with a guard page below the usable region
 */

use crate::core::limits::FALLBACK_PAGE_SIZE;
use crate::core::{KernelError, KernelResult};
use std::ffi::c_void;
use std::ptr::{self, NonNull};

/// Owned execution stack
///
/// Layout, low to high address: one `PROT_NONE` guard page, then the usable
/// region. Stacks grow down, so an overflow faults on the guard page instead
/// of silently writing into a neighbouring mapping.
pub struct Stack {
    base: NonNull<c_void>,
    mapped: usize,
    guard: usize,
}

impl Stack {
    /// Map a stack with at least `size` usable bytes (rounded up to pages)
    pub fn new(size: usize) -> KernelResult<Self> {
        let page = page_size();
        let usable = round_up(size.max(page), page);
        let mapped = usable + page;

        // SAFETY: fresh anonymous mapping, no existing memory is touched
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                mapped,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_STACK,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(KernelError::ResourceExhausted(format!(
                "mmap of {} byte stack: {}",
                mapped,
                std::io::Error::last_os_error()
            )));
        }

        // SAFETY: addr is the start of the mapping created above
        if unsafe { libc::mprotect(addr, page, libc::PROT_NONE) } != 0 {
            let err = std::io::Error::last_os_error();
            unsafe { libc::munmap(addr, mapped) };
            return Err(KernelError::ResourceExhausted(format!(
                "stack guard page: {}",
                err
            )));
        }

        let base = NonNull::new(addr).ok_or_else(|| {
            KernelError::ResourceExhausted("mmap returned a null stack".into())
        })?;

        Ok(Self {
            base,
            mapped,
            guard: page,
        })
    }

    /// Lowest usable address (just above the guard page)
    pub fn bottom(&self) -> *mut c_void {
        // SAFETY: guard < mapped, result stays inside the mapping
        unsafe { self.base.as_ptr().cast::<u8>().add(self.guard).cast() }
    }

    /// Bytes available to the code running on this stack
    pub fn usable_size(&self) -> usize {
        self.mapped - self.guard
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        // SAFETY: we own the whole mapping
        unsafe {
            libc::munmap(self.base.as_ptr(), self.mapped);
        }
    }
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("bottom", &self.bottom())
            .field("usable_size", &self.usable_size())
            .finish()
    }
}

pub(crate) fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if raw > 0 {
        raw as usize
    } else {
        FALLBACK_PAGE_SIZE
    }
}

#[inline]
fn round_up(value: usize, align: usize) -> usize {
    (value + align - 1) / align * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_rounds_to_pages() {
        let page = page_size();
        let stack = Stack::new(page + 1).unwrap();
        assert_eq!(stack.usable_size(), 2 * page);
        assert_eq!(stack.bottom() as usize % page, 0);
    }

    #[test]
    fn test_usable_region_is_writable() {
        let stack = Stack::new(16 * 1024).unwrap();
        let bytes = stack.bottom().cast::<u8>();
        unsafe {
            bytes.write(0xAB);
            bytes.add(stack.usable_size() - 1).write(0xCD);
            assert_eq!(bytes.read(), 0xAB);
        }
    }

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(1, 4096), 4096);
        assert_eq!(round_up(4096, 4096), 4096);
        assert_eq!(round_up(4097, 4096), 8192);
    }
}
