//! An allocator wrapper that keeps allocation statistics.
//!
//! Useful for diagnostics and for asserting buffer ownership behavior in tests:
//! every reallocation, copy and release of a container is visible in the counters.

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use podkit_common::Result;

use crate::raw_alloc::{RawAlloc, SystemAlloc};

/// Counters shared by all clones of a [`CountingAlloc`].
#[derive(Debug, Default)]
pub struct AllocStats {
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    live_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
}

impl AllocStats {
    /// Total number of successful allocations.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Total number of deallocations.
    pub fn deallocations(&self) -> usize {
        self.deallocations.load(Ordering::Relaxed)
    }

    /// Number of blocks currently allocated.
    ///
    /// A snapshot under concurrent use; saturates at zero when the two counters are
    /// read between an allocation and its matching deallocation.
    pub fn live_allocations(&self) -> usize {
        let deallocations = self.deallocations();
        self.allocations().saturating_sub(deallocations)
    }

    /// Bytes currently allocated.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }

    /// Highest value `live_bytes` has reached.
    pub fn peak_bytes(&self) -> usize {
        self.peak_bytes.load(Ordering::Relaxed)
    }

    fn on_allocate(&self, size: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        let live = self.live_bytes.fetch_add(size, Ordering::Relaxed) + size;
        self.peak_bytes.fetch_max(live, Ordering::Relaxed);
    }

    fn on_deallocate(&self, size: usize) {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        self.live_bytes.fetch_sub(size, Ordering::Relaxed);
    }
}

/// Wraps an allocator and records every allocation and deallocation in a shared
/// [`AllocStats`].
#[derive(Debug, Clone, Default)]
pub struct CountingAlloc<A = SystemAlloc> {
    inner: A,
    stats: Arc<AllocStats>,
}

impl CountingAlloc<SystemAlloc> {
    pub fn new() -> CountingAlloc<SystemAlloc> {
        CountingAlloc::wrap(SystemAlloc)
    }
}

impl<A> CountingAlloc<A> {
    pub fn wrap(inner: A) -> CountingAlloc<A> {
        CountingAlloc {
            inner,
            stats: Arc::default(),
        }
    }

    pub fn stats(&self) -> &Arc<AllocStats> {
        &self.stats
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

unsafe impl<A: RawAlloc> RawAlloc for CountingAlloc<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        let ptr = self.inner.allocate(layout)?;
        self.stats.on_allocate(layout.size());
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { self.inner.deallocate(ptr, layout) };
        self.stats.on_deallocate(layout.size());
    }
}
