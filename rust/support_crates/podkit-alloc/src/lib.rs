//! Memory allocation seams for the podkit containers.
//!
//! # Modules
//!
//! - [`raw_alloc`]: the [`RawAlloc`] trait and the default [`SystemAlloc`]
//! - [`counting`]: [`CountingAlloc`], an allocator wrapper that records statistics
//! - [`align`]: alignment arithmetic on numbers and pointers

pub mod align;
pub mod counting;
pub mod raw_alloc;

pub use counting::{AllocStats, CountingAlloc};
pub use raw_alloc::{RawAlloc, SystemAlloc};
