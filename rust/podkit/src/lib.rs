//! # podkit: plain-old-data containers
//!
//! podkit provides two small building blocks for code that wants full control over
//! where its bytes live:
//!
//! * [`PodArray`] - a growable array of `Copy` values. Growth is amortized (doubling),
//!   positional insert/remove shift elements with plain memory moves, `resize`
//!   reallocates to an exact capacity, and `release` hands the buffer back at a point
//!   of the caller's choosing.
//! * [`StridedView`] / [`StridedViewMut`] - windows onto one field of every record in
//!   someone else's buffer (an array of structs, or interleaved data loaded from a
//!   file), addressed as `base + i * stride + offset`, with `copy_deinterlace` to pack
//!   the field into its own contiguous array.
//!
//! ## Module Organization
//!
//! * [`array`] - the array and view types
//! * [`common`] - error and result types shared by all crates
//!
//! ### Support Modules
//!
//! * [`support::alloc`] - the pluggable allocator seam and allocation statistics
//!
//! ## Allocation
//!
//! Every array allocates through a [`RawAlloc`](support::alloc::RawAlloc) type
//! parameter that defaults to the global allocator. Wrapping it in a
//! [`CountingAlloc`](support::alloc::CountingAlloc) makes every reallocation, copy and
//! release observable.
//!
//! ## Logging
//!
//! Reallocations, copies and de-interlacing are reported at `trace` level through the
//! `log` facade; a shrinking `resize` that discards live elements is reported at
//! `debug` level. No logger is installed by the library.

pub use podkit_array as array;
pub use podkit_common as common;

pub use podkit_array::{PodArray, StridedView, StridedViewMut};

pub mod support {
    pub use podkit_alloc as alloc;
}
