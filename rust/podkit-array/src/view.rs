//! Strided views: one field of every record in a borrowed buffer, addressed as if it
//! were a contiguous array.
//!
//! Logical element `i` lives at byte address `base + i * stride + offset`. A view over
//! the `y` field of a slice of `[x, y, z]` records has `stride = size_of::<record>()`
//! and `offset = offset_of!(record, y)`.
//!
//! - [`StridedView`]: shared view, `Copy`
//! - [`StridedViewMut`]: exclusive view that can write through to the records
//!
//! The safe constructors require [`bytemuck::Pod`] element and record types and verify
//! the layout (see [`StridedView::from_bytes`]). The `unsafe` [`from_raw_parts`]
//! constructors accept any layout and trust the caller completely.
//!
//! [`from_raw_parts`]: StridedView::from_raw_parts

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Index, IndexMut};
use std::ptr::NonNull;

use bytemuck::Pod;
use podkit_alloc::align::{is_aligned, is_aligned_ptr};
use podkit_alloc::{RawAlloc, SystemAlloc};
use podkit_common::{Error, Result, verify_arg};

use crate::array::{PodArray, allocation_failure};

// ============================================================================
// Layout validation
// ============================================================================

/// Checks that `count` elements of `T` at `base + i * stride + offset` are well formed:
/// each element fits in its stride, all of them are aligned, and the addressed range
/// does not overflow.
fn validate_layout<T>(base: *const u8, count: usize, stride: usize, offset: usize) -> Result<()> {
    let size = mem::size_of::<T>();
    let align = mem::align_of::<T>();
    verify_arg!(
        offset,
        offset.checked_add(size).is_some_and(|end| end <= stride)
    );
    verify_arg!(stride, is_aligned(stride, align));
    verify_arg!(
        offset,
        count == 0 || is_aligned_ptr(base.wrapping_add(offset), align)
    );
    verify_arg!(count, count.checked_mul(stride).is_some());
    Ok(())
}

/// Number of bytes from `base` up to the end of the last element.
fn required_extent<T>(count: usize, stride: usize, offset: usize) -> Option<usize> {
    if count == 0 {
        return Some(0);
    }
    (count - 1)
        .checked_mul(stride)?
        .checked_add(offset)?
        .checked_add(mem::size_of::<T>())
}

/// Byte offset of the field that `field` projects out of the first record.
fn field_offset<D, T>(records: &[D], field: impl FnOnce(&D) -> &T) -> Result<usize> {
    let Some(first) = records.first() else {
        return Ok(0);
    };
    let record = first as *const D as usize;
    let target = field(first) as *const T as usize;
    match target.checked_sub(record) {
        Some(offset)
            if offset
                .checked_add(mem::size_of::<T>())
                .is_some_and(|end| end <= mem::size_of::<D>()) =>
        {
            Ok(offset)
        }
        _ => Err(Error::invalid_arg(
            "field",
            "accessor must return a reference into the record",
        )),
    }
}

/// Formats the elements of a view as a list.
struct DebugItems<'a, T>(StridedIter<'a, T>);

impl<T: fmt::Debug> fmt::Debug for DebugItems<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.clone()).finish()
    }
}

#[cold]
#[track_caller]
fn out_of_bounds(id: usize, count: usize) -> ! {
    panic!("index out of bounds: the count is {count} but the index is {id}");
}

// ============================================================================
// StridedView
// ============================================================================

/// A shared, non-owning view of `count` values of `T` spaced `stride` bytes apart.
pub struct StridedView<'a, T> {
    base: NonNull<u8>,
    count: usize,
    stride: usize,
    offset: usize,
    _marker: PhantomData<&'a T>,
}

unsafe impl<T: Sync> Send for StridedView<'_, T> {}
unsafe impl<T: Sync> Sync for StridedView<'_, T> {}

impl<T> Clone for StridedView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StridedView<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for StridedView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedView")
            .field("count", &self.count)
            .field("stride", &self.stride)
            .field("offset", &self.offset)
            .field("items", &DebugItems(self.iter()))
            .finish()
    }
}

impl<'a, T: Pod> StridedView<'a, T> {
    /// View over the field that `field` selects in each record.
    ///
    /// ```
    /// use podkit_array::StridedView;
    ///
    /// let points = [[1.0f32, 2.0], [3.0, 4.0]];
    /// let ys = StridedView::from_field(&points, |p| &p[1]).unwrap();
    /// assert_eq!(ys.iter().copied().collect::<Vec<_>>(), vec![2.0, 4.0]);
    /// ```
    pub fn from_field<D: Pod>(records: &'a [D], field: impl FnOnce(&D) -> &T) -> Result<Self> {
        let offset = field_offset(records, field)?;
        Self::from_records(records, offset)
    }

    /// View over the `T` located `offset` bytes into each record, for example
    /// `StridedView::<f32>::from_records(&points, offset_of!(Point, y))`.
    pub fn from_records<D: Pod>(records: &'a [D], offset: usize) -> Result<Self> {
        let base = records.as_ptr() as *const u8;
        let stride = mem::size_of::<D>();
        validate_layout::<T>(base, records.len(), stride, offset)?;
        Ok(unsafe { Self::from_raw_parts(base, records.len(), stride, offset) })
    }

    /// View over `count` elements of a byte buffer, e.g. interleaved data read from a
    /// file.
    ///
    /// Fails if `offset + size_of::<T>() > stride`, if `stride` or the first element
    /// is misaligned for `T`, or if the last element does not fit in `bytes`.
    pub fn from_bytes(bytes: &'a [u8], count: usize, stride: usize, offset: usize) -> Result<Self> {
        validate_layout::<T>(bytes.as_ptr(), count, stride, offset)?;
        verify_arg!(
            count,
            required_extent::<T>(count, stride, offset).is_some_and(|end| end <= bytes.len())
        );
        Ok(unsafe { Self::from_raw_parts(bytes.as_ptr(), count, stride, offset) })
    }
}

impl<'a, T> StridedView<'a, T> {
    /// Builds a view without any validation.
    ///
    /// # Safety
    ///
    /// For every `i < count`, `base + i * stride + offset` must point to an initialized,
    /// properly aligned `T` that remains valid and unmodified for `'a`.
    pub unsafe fn from_raw_parts(
        base: *const u8,
        count: usize,
        stride: usize,
        offset: usize,
    ) -> Self {
        StridedView {
            base: NonNull::new(base as *mut u8).unwrap_or(NonNull::dangling()),
            count,
            stride,
            offset,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes between consecutive elements.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Byte offset of the element within each stride.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn element_ptr(&self, id: usize) -> *const T {
        self.base.as_ptr().wrapping_add(id * self.stride + self.offset) as *const T
    }

    #[inline]
    pub fn get(&self, id: usize) -> Option<&'a T> {
        if id < self.count {
            Some(unsafe { &*self.element_ptr(id) })
        } else {
            None
        }
    }

    /// # Safety
    ///
    /// `id` must be less than [`count`](StridedView::count).
    #[inline]
    pub unsafe fn get_unchecked(&self, id: usize) -> &'a T {
        debug_assert!(id < self.count);
        unsafe { &*self.element_ptr(id) }
    }

    #[inline]
    pub fn last(&self) -> Option<&'a T> {
        self.count.checked_sub(1).and_then(|id| self.get(id))
    }

    /// Calls `visitor` on every element, in index order.
    pub fn each(&self, visitor: impl FnMut(&'a T)) {
        self.iter().for_each(visitor);
    }

    pub fn iter(&self) -> StridedIter<'a, T> {
        StridedIter {
            cursor: Cursor::new(self.base, self.count, self.stride, self.offset),
            _marker: PhantomData,
        }
    }
}

impl<'a, T: Copy> StridedView<'a, T> {
    /// Copies the elements into a new, tightly packed array of `count` elements.
    pub fn copy_deinterlace(&self) -> PodArray<T> {
        self.copy_deinterlace_in(SystemAlloc)
    }

    /// Same as [`copy_deinterlace`](StridedView::copy_deinterlace), allocating from
    /// `alloc`.
    pub fn copy_deinterlace_in<A: RawAlloc>(&self, alloc: A) -> PodArray<T, A> {
        match self.try_copy_deinterlace_in(alloc) {
            Ok(array) => array,
            Err(e) => allocation_failure(e),
        }
    }

    /// Fallible version of [`copy_deinterlace_in`](StridedView::copy_deinterlace_in).
    pub fn try_copy_deinterlace_in<A: RawAlloc>(&self, alloc: A) -> Result<PodArray<T, A>> {
        let mut result = PodArray::try_with_capacity_in(self.count, alloc)?;
        for value in self.iter() {
            unsafe { result.push_unchecked(*value) };
        }
        log::trace!(
            "deinterlaced {} elements (stride {}, offset {})",
            self.count,
            self.stride,
            self.offset
        );
        Ok(result)
    }
}

impl<T> Index<usize> for StridedView<'_, T> {
    type Output = T;

    #[inline]
    #[track_caller]
    fn index(&self, id: usize) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => out_of_bounds(id, self.count),
        }
    }
}

impl<'a, T> IntoIterator for StridedView<'a, T> {
    type Item = &'a T;
    type IntoIter = StridedIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// StridedViewMut
// ============================================================================

/// An exclusive, non-owning view of `count` values of `T` spaced `stride` bytes apart.
///
/// Writes go straight to the backing records.
pub struct StridedViewMut<'a, T> {
    base: NonNull<u8>,
    count: usize,
    stride: usize,
    offset: usize,
    _marker: PhantomData<&'a mut T>,
}

unsafe impl<T: Send> Send for StridedViewMut<'_, T> {}
unsafe impl<T: Sync> Sync for StridedViewMut<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for StridedViewMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedViewMut")
            .field("count", &self.count)
            .field("stride", &self.stride)
            .field("offset", &self.offset)
            .field("items", &DebugItems(self.iter()))
            .finish()
    }
}

impl<'a, T: Pod> StridedViewMut<'a, T> {
    /// Mutable counterpart of [`StridedView::from_field`].
    pub fn from_field<D: Pod>(
        records: &'a mut [D],
        field: impl FnOnce(&D) -> &T,
    ) -> Result<Self> {
        let offset = field_offset(records, field)?;
        Self::from_records(records, offset)
    }

    /// Mutable counterpart of [`StridedView::from_records`].
    pub fn from_records<D: Pod>(records: &'a mut [D], offset: usize) -> Result<Self> {
        let base = records.as_mut_ptr() as *mut u8;
        let stride = mem::size_of::<D>();
        validate_layout::<T>(base, records.len(), stride, offset)?;
        Ok(unsafe { Self::from_raw_parts(base, records.len(), stride, offset) })
    }

    /// Mutable counterpart of [`StridedView::from_bytes`].
    pub fn from_bytes(
        bytes: &'a mut [u8],
        count: usize,
        stride: usize,
        offset: usize,
    ) -> Result<Self> {
        validate_layout::<T>(bytes.as_ptr(), count, stride, offset)?;
        verify_arg!(
            count,
            required_extent::<T>(count, stride, offset).is_some_and(|end| end <= bytes.len())
        );
        Ok(unsafe { Self::from_raw_parts(bytes.as_mut_ptr(), count, stride, offset) })
    }
}

impl<'a, T> StridedViewMut<'a, T> {
    /// Builds a mutable view without any validation.
    ///
    /// # Safety
    ///
    /// Same as [`StridedView::from_raw_parts`], and in addition the addressed elements
    /// must not overlap each other and must not be accessed through any other pointer
    /// for `'a`.
    pub unsafe fn from_raw_parts(base: *mut u8, count: usize, stride: usize, offset: usize) -> Self {
        StridedViewMut {
            base: NonNull::new(base).unwrap_or(NonNull::dangling()),
            count,
            stride,
            offset,
            _marker: PhantomData,
        }
    }

    /// Reborrows as a shared view.
    #[inline]
    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView {
            base: self.base,
            count: self.count,
            stride: self.stride,
            offset: self.offset,
            _marker: PhantomData,
        }
    }

    /// Converts into a shared view for the rest of `'a`.
    #[inline]
    pub fn into_view(self) -> StridedView<'a, T> {
        StridedView {
            base: self.base,
            count: self.count,
            stride: self.stride,
            offset: self.offset,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn element_ptr(&self, id: usize) -> *mut T {
        self.base.as_ptr().wrapping_add(id * self.stride + self.offset) as *mut T
    }

    #[inline]
    pub fn get(&self, id: usize) -> Option<&T> {
        self.as_view().get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: usize) -> Option<&mut T> {
        if id < self.count {
            Some(unsafe { &mut *self.element_ptr(id) })
        } else {
            None
        }
    }

    /// Overwrites the element at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id >= count`.
    #[inline]
    #[track_caller]
    pub fn set(&mut self, id: usize, value: T) {
        match self.get_mut(id) {
            Some(slot) => *slot = value,
            None => out_of_bounds(id, self.count),
        }
    }

    /// # Safety
    ///
    /// `id` must be less than [`count`](StridedViewMut::count).
    #[inline]
    pub unsafe fn get_unchecked(&self, id: usize) -> &T {
        debug_assert!(id < self.count);
        unsafe { &*self.element_ptr(id) }
    }

    /// # Safety
    ///
    /// `id` must be less than [`count`](StridedViewMut::count).
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, id: usize) -> &mut T {
        debug_assert!(id < self.count);
        unsafe { &mut *self.element_ptr(id) }
    }

    /// # Safety
    ///
    /// `id` must be less than [`count`](StridedViewMut::count).
    #[inline]
    pub unsafe fn set_unchecked(&mut self, id: usize, value: T) {
        debug_assert!(id < self.count);
        unsafe { self.element_ptr(id).write(value) }
    }

    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.as_view().last()
    }

    #[inline]
    pub fn last_mut(&mut self) -> Option<&mut T> {
        match self.count.checked_sub(1) {
            Some(id) => self.get_mut(id),
            None => None,
        }
    }

    /// Calls `visitor` on every element, in index order. The visitor may modify the
    /// element in place.
    pub fn each(&mut self, visitor: impl FnMut(&mut T)) {
        self.iter_mut().for_each(visitor);
    }

    pub fn iter(&self) -> StridedIter<'_, T> {
        self.as_view().iter()
    }

    pub fn iter_mut(&mut self) -> StridedIterMut<'_, T> {
        StridedIterMut {
            cursor: Cursor::new(self.base, self.count, self.stride, self.offset),
            _marker: PhantomData,
        }
    }
}

impl<T: Copy> StridedViewMut<'_, T> {
    /// Copies the elements into a new, tightly packed array of `count` elements.
    pub fn copy_deinterlace(&self) -> PodArray<T> {
        self.as_view().copy_deinterlace()
    }

    pub fn copy_deinterlace_in<A: RawAlloc>(&self, alloc: A) -> PodArray<T, A> {
        self.as_view().copy_deinterlace_in(alloc)
    }

    pub fn try_copy_deinterlace_in<A: RawAlloc>(&self, alloc: A) -> Result<PodArray<T, A>> {
        self.as_view().try_copy_deinterlace_in(alloc)
    }

    /// Writes `value` into every element.
    pub fn fill(&mut self, value: T) {
        self.each(|slot| *slot = value);
    }
}

impl<T> Index<usize> for StridedViewMut<'_, T> {
    type Output = T;

    #[inline]
    #[track_caller]
    fn index(&self, id: usize) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => out_of_bounds(id, self.count),
        }
    }
}

impl<T> IndexMut<usize> for StridedViewMut<'_, T> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, id: usize) -> &mut T {
        let count = self.count;
        match self.get_mut(id) {
            Some(value) => value,
            None => out_of_bounds(id, count),
        }
    }
}

impl<'a, T> IntoIterator for StridedViewMut<'a, T> {
    type Item = &'a mut T;
    type IntoIter = StridedIterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        StridedIterMut {
            cursor: Cursor::new(self.base, self.count, self.stride, self.offset),
            _marker: PhantomData,
        }
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Front/back positions over a strided range.
#[derive(Clone)]
struct Cursor {
    base: NonNull<u8>,
    front: usize,
    back: usize,
    stride: usize,
    offset: usize,
}

impl Cursor {
    fn new(base: NonNull<u8>, count: usize, stride: usize, offset: usize) -> Cursor {
        Cursor {
            base,
            front: 0,
            back: count,
            stride,
            offset,
        }
    }

    #[inline]
    fn address(&self, id: usize) -> *mut u8 {
        self.base.as_ptr().wrapping_add(id * self.stride + self.offset)
    }

    #[inline]
    fn next(&mut self) -> Option<*mut u8> {
        if self.front < self.back {
            let p = self.address(self.front);
            self.front += 1;
            Some(p)
        } else {
            None
        }
    }

    #[inline]
    fn next_back(&mut self) -> Option<*mut u8> {
        if self.front < self.back {
            self.back -= 1;
            Some(self.address(self.back))
        } else {
            None
        }
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.back - self.front
    }
}

/// Iterator over the elements of a [`StridedView`].
pub struct StridedIter<'a, T> {
    cursor: Cursor,
    _marker: PhantomData<&'a T>,
}

impl<T> Clone for StridedIter<'_, T> {
    fn clone(&self) -> Self {
        StridedIter {
            cursor: self.cursor.clone(),
            _marker: PhantomData,
        }
    }
}

unsafe impl<T: Sync> Send for StridedIter<'_, T> {}
unsafe impl<T: Sync> Sync for StridedIter<'_, T> {}

impl<'a, T> Iterator for StridedIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.cursor.next().map(|p| unsafe { &*(p as *const T) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cursor.remaining();
        (remaining, Some(remaining))
    }
}

impl<'a, T> DoubleEndedIterator for StridedIter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        self.cursor.next_back().map(|p| unsafe { &*(p as *const T) })
    }
}

impl<T> ExactSizeIterator for StridedIter<'_, T> {}
impl<T> FusedIterator for StridedIter<'_, T> {}

/// Mutable iterator over the elements of a [`StridedViewMut`].
pub struct StridedIterMut<'a, T> {
    cursor: Cursor,
    _marker: PhantomData<&'a mut T>,
}

unsafe impl<T: Send> Send for StridedIterMut<'_, T> {}
unsafe impl<T: Sync> Sync for StridedIterMut<'_, T> {}

impl<'a, T> Iterator for StridedIterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        self.cursor.next().map(|p| unsafe { &mut *(p as *mut T) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cursor.remaining();
        (remaining, Some(remaining))
    }
}

impl<'a, T> DoubleEndedIterator for StridedIterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        self.cursor.next_back().map(|p| unsafe { &mut *(p as *mut T) })
    }
}

impl<T> ExactSizeIterator for StridedIterMut<'_, T> {}
impl<T> FusedIterator for StridedIterMut<'_, T> {}
