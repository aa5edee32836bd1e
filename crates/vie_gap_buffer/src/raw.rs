use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::AllocError;

/// An untyped byte allocation whose resizes can fail without aborting.
pub struct RawBuf {
    ptr: NonNull<u8>,
    cap: usize,
}

impl RawBuf {
    #[inline]
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
        }
    }

    pub fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let mut buf = Self::new();
        if capacity > 0 {
            buf.try_set_capacity(capacity)?;
        }
        Ok(buf)
    }

    /// Reallocate to exactly `new_cap` bytes.
    ///
    /// Bytes in `0..min(old_cap, new_cap)` are preserved. On failure the
    /// previous allocation is left untouched.
    ///
    /// # Panics
    /// Panics if `new_cap == 0`: a live buffer is never freed through a
    /// resize.
    pub fn try_set_capacity(&mut self, new_cap: usize) -> Result<(), AllocError> {
        assert!(new_cap > 0, "capacity was zero");

        if new_cap == self.cap {
            return Ok(());
        }

        let new_layout = Layout::array::<u8>(new_cap).map_err(|_| AllocError::CapacityOverflow)?;

        let new_ptr = if self.cap == 0 {
            unsafe { alloc::alloc(new_layout) }
        } else {
            unsafe { alloc::realloc(self.as_ptr(), self.layout(), new_layout.size()) }
        };

        // `realloc` leaves the old block valid when it returns null.
        self.ptr = NonNull::new(new_ptr).ok_or(AllocError::OutOfMemory {
            requested: new_cap,
        })?;
        self.cap = new_cap;

        Ok(())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    fn layout(&self) -> Layout {
        // The current capacity was validated when it was allocated.
        unsafe { Layout::from_size_align_unchecked(self.cap, 1) }
    }
}

impl Drop for RawBuf {
    #[inline]
    fn drop(&mut self) {
        if self.cap == 0 {
            return;
        }

        unsafe { alloc::dealloc(self.as_ptr(), self.layout()) };
    }
}
