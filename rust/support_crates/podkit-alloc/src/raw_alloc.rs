//! `RawAlloc`: the pluggable allocate/deallocate capability used by podkit containers.

use std::alloc::Layout;
use std::ptr::NonNull;

use podkit_common::{Error, Result};

/// A source of raw memory blocks.
///
/// Containers never request zero-sized blocks; a zero-sized buffer is represented
/// by a dangling pointer and never reaches the allocator.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - A block returned by `allocate(layout)` is valid for reads and writes of
///   `layout.size()` bytes and aligned to `layout.align()`.
/// - The block stays valid until it is passed to `deallocate` with the same layout.
/// - Blocks returned by distinct `allocate` calls do not overlap.
/// - A clone of an allocator can deallocate blocks obtained from the original.
pub unsafe trait RawAlloc {
    /// Allocates a block described by `layout`. `layout.size()` is non-zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Returns a block to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this allocator (or a clone of it)
    /// with the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<A: RawAlloc + ?Sized> RawAlloc for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

/// The process-wide global allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAlloc;

unsafe impl RawAlloc for SystemAlloc {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        debug_assert_ne!(layout.size(), 0);
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or_else(|| Error::allocation_failed(layout))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_alloc_roundtrip() {
        let layout = Layout::array::<u64>(16).unwrap();
        let ptr = SystemAlloc.allocate(layout).unwrap();
        assert!(crate::align::is_aligned_ptr(ptr.as_ptr(), layout.align()));
        unsafe {
            ptr.as_ptr().write_bytes(0xAB, layout.size());
            assert_eq!(*ptr.as_ptr().add(layout.size() - 1), 0xAB);
            SystemAlloc.deallocate(ptr, layout);
        }
    }

    #[test]
    fn test_alloc_through_reference() {
        let alloc = SystemAlloc;
        let by_ref = &alloc;
        let layout = Layout::from_size_align(100, 16).unwrap();
        let ptr = by_ref.allocate(layout).unwrap();
        assert!(crate::align::is_aligned_ptr(ptr.as_ptr(), 16));
        unsafe { by_ref.deallocate(ptr, layout) };
    }
}
