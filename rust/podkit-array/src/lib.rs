//! Plain-old-data containers with explicit, predictable memory ownership.
//!
//! - [`PodArray`]: a growable array of `Copy` values that owns its buffer and never
//!   runs per-element constructors or destructors.
//! - [`StridedView`] / [`StridedViewMut`]: non-owning windows onto one field of every
//!   record in a borrowed buffer, with [`copy_deinterlace`](StridedView::copy_deinterlace)
//!   to pack the field into a contiguous [`PodArray`].
//!
//! ```
//! use bytemuck::{Pod, Zeroable};
//! use podkit_array::PodArray;
//!
//! #[repr(C)]
//! #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
//! struct Vec3 {
//!     x: f32,
//!     y: f32,
//!     z: f32,
//! }
//!
//! let mut vertices = PodArray::<Vec3>::new();
//! vertices.resize(3);
//! vertices.add(Vec3 { x: 1.0, y: 0.0, z: 0.0 });
//! vertices.add(Vec3 { x: 0.0, y: 1.0, z: 0.0 });
//! vertices.add(Vec3 { x: 0.0, y: 0.0, z: 1.0 });
//!
//! for v in vertices.iter_mut() {
//!     v.x += 1.0;
//! }
//!
//! let mut heights = vertices.view_mut(|v| &v.y)?;
//! for i in 0..heights.count() {
//!     heights[i] = 10.0;
//! }
//! let packed = heights.copy_deinterlace();
//! assert_eq!(packed.as_slice(), &[10.0, 10.0, 10.0]);
//!
//! vertices.release();
//! assert_eq!(packed.count(), 3);
//! # Ok::<(), podkit_array::Error>(())
//! ```

pub mod array;
pub mod view;

pub use array::PodArray;
pub use podkit_alloc::{CountingAlloc, RawAlloc, SystemAlloc};
pub use podkit_common::{Error, ErrorKind, Result};
pub use view::{StridedIter, StridedIterMut, StridedView, StridedViewMut};
