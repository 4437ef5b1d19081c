//! `PodArray`: a growable array of plain-old-data values with explicit, predictable
//! buffer management.

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr::{self, NonNull};
use std::slice::SliceIndex;

use bytemuck::Pod;
use podkit_alloc::{RawAlloc, SystemAlloc};
use podkit_common::{Error, ErrorKind, Result};

use crate::view::{StridedView, StridedViewMut};

/// A growable array of `Copy` values backed by a buffer from a [`RawAlloc`].
///
/// Elements are relocated bitwise and never dropped individually. The array tracks
/// `count` (live elements) and `capacity` (allocated slots) and only reallocates
/// when an operation needs more room or when [`resize`](PodArray::resize) is called
/// explicitly.
///
/// The type is move-only: duplicating the buffer requires an explicit
/// [`copy`](PodArray::copy) (or `clone`). The buffer can be returned early with
/// [`release`](PodArray::release); dropping the array releases it as well.
///
/// # Growth
/// - [`add`](PodArray::add) grows to `max(4, capacity * 2)` once `count + 1 >= capacity`.
/// - [`insert`](PodArray::insert) grows to `max(1, capacity * 2)` when the buffer is full.
/// - Capacity never shrinks unless [`resize`](PodArray::resize) asks for it.
pub struct PodArray<T: Copy, A: RawAlloc = SystemAlloc> {
    /// Start of the buffer, dangling when nothing is allocated.
    ptr: NonNull<T>,
    /// Number of live elements, `count <= capacity`.
    count: usize,
    /// Number of allocated element slots.
    capacity: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

unsafe impl<T: Copy + Send, A: RawAlloc + Send> Send for PodArray<T, A> {}
unsafe impl<T: Copy + Sync, A: RawAlloc + Sync> Sync for PodArray<T, A> {}

impl<T: Copy> PodArray<T> {
    /// Creates an empty array. Nothing is allocated until the first element arrives.
    pub const fn new() -> PodArray<T> {
        PodArray::new_in(SystemAlloc)
    }

    /// Creates an empty array with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> PodArray<T> {
        PodArray::with_capacity_in(capacity, SystemAlloc)
    }

    /// Creates an array holding a copy of `values`.
    pub fn from_slice(values: &[T]) -> PodArray<T> {
        let mut array = PodArray::with_capacity(values.len());
        array.extend_from_slice(values);
        array
    }
}

impl<T: Copy, A: RawAlloc> PodArray<T, A> {
    /// Smallest capacity [`add`](PodArray::add) grows to.
    pub const ADD_MIN_CAPACITY: usize = 4;
    /// Smallest capacity [`insert`](PodArray::insert) grows to.
    pub const INSERT_MIN_CAPACITY: usize = 1;

    /// Creates an empty array that will allocate from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        PodArray {
            ptr: NonNull::dangling(),
            count: 0,
            capacity: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Creates an empty array with room for `capacity` elements, allocated from `alloc`.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        match Self::try_with_capacity_in(capacity, alloc) {
            Ok(array) => array,
            Err(e) => allocation_failure(e),
        }
    }

    /// Fallible version of [`with_capacity_in`](PodArray::with_capacity_in).
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self> {
        let mut array = Self::new_in(alloc);
        if capacity != 0 {
            array.try_resize(capacity)?;
        }
        Ok(array)
    }

    /// Number of live elements.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Same as [`count`](PodArray::count).
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of element slots currently allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.count) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.count) }
    }

    /// Appends `item` and returns its index.
    ///
    /// Grows the buffer to `max(4, capacity * 2)` first when `count + 1 >= capacity`.
    pub fn add(&mut self, item: T) -> usize {
        if self.count + 1 >= self.capacity {
            self.resize(grown_capacity(self.capacity, Self::ADD_MIN_CAPACITY));
        }
        unsafe { self.push_unchecked(item) };
        self.count - 1
    }

    /// Inserts `item` at position `at`, shifting `[at, count)` one slot to the right.
    ///
    /// # Panics
    ///
    /// Panics if `at > count`.
    pub fn insert(&mut self, at: usize, item: T) {
        assert!(
            at <= self.count,
            "insertion index (is {at}) should be <= count (is {})",
            self.count
        );
        if self.count + 1 > self.capacity {
            self.resize(grown_capacity(self.capacity, Self::INSERT_MIN_CAPACITY));
        }
        unsafe {
            let slot = self.ptr.as_ptr().add(at);
            ptr::copy(slot, slot.add(1), self.count - at);
            slot.write(item);
        }
        self.count += 1;
    }

    /// Removes and returns the element at `at`, shifting `[at + 1, count)` one slot to
    /// the left. Capacity is left unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `at >= count`.
    pub fn remove(&mut self, at: usize) -> T {
        assert!(
            at < self.count,
            "removal index (is {at}) should be < count (is {})",
            self.count
        );
        unsafe {
            let slot = self.ptr.as_ptr().add(at);
            let item = slot.read();
            ptr::copy(slot.add(1), slot, self.count - at - 1);
            self.count -= 1;
            item
        }
    }

    /// Removes and returns the last element.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    pub fn pop(&mut self) -> T {
        assert!(self.count != 0, "pop called on an empty PodArray");
        self.remove(self.count - 1)
    }

    /// Reallocates the buffer to hold exactly `to_capacity` elements.
    ///
    /// When `to_capacity < count`, the elements past the new capacity are discarded
    /// and `count` becomes `to_capacity`. A new buffer is allocated on every call,
    /// including when `to_capacity` equals the current capacity.
    ///
    /// # Panics
    ///
    /// Panics if the byte size of the new buffer overflows `isize`, and aborts through
    /// [`std::alloc::handle_alloc_error`] if the allocator fails.
    pub fn resize(&mut self, to_capacity: usize) {
        if let Err(e) = self.try_resize(to_capacity) {
            allocation_failure(e);
        }
    }

    /// Fallible version of [`resize`](PodArray::resize). On error the array is unchanged.
    pub fn try_resize(&mut self, to_capacity: usize) -> Result<()> {
        let new_ptr = self.allocate_buffer(to_capacity)?;
        let count = self.count.min(to_capacity);
        if count < self.count {
            log::debug!(
                "PodArray resize to {to_capacity} slots discards {} live elements",
                self.count - count
            );
        }
        log::trace!(
            "PodArray resize: {} -> {to_capacity} slots, {count} live",
            self.capacity
        );

        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), count);
            self.free_buffer();
        }
        self.ptr = new_ptr;
        self.capacity = to_capacity;
        self.count = count;
        Ok(())
    }

    /// Makes sure at least `additional` more elements fit without reallocating.
    pub fn reserve(&mut self, additional: usize) {
        let required = self
            .count
            .checked_add(additional)
            .unwrap_or_else(|| capacity_overflow());
        if required > self.capacity {
            let grown = grown_capacity(self.capacity, Self::ADD_MIN_CAPACITY);
            self.resize(required.max(grown));
        }
    }

    /// Appends a copy of every element of `values`.
    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.reserve(values.len());
        unsafe {
            ptr::copy_nonoverlapping(
                values.as_ptr(),
                self.ptr.as_ptr().add(self.count),
                values.len(),
            );
        }
        self.count += values.len();
    }

    #[inline]
    pub fn get(&self, id: usize) -> Option<&T> {
        self.as_slice().get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(id)
    }

    /// Overwrites the element at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id >= count`.
    #[inline]
    pub fn set(&mut self, id: usize, value: T) {
        self.as_mut_slice()[id] = value;
    }

    /// # Safety
    ///
    /// `id` must be less than [`count`](PodArray::count).
    #[inline]
    pub unsafe fn get_unchecked(&self, id: usize) -> &T {
        debug_assert!(id < self.count);
        unsafe { &*self.ptr.as_ptr().add(id) }
    }

    /// # Safety
    ///
    /// `id` must be less than [`count`](PodArray::count).
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, id: usize) -> &mut T {
        debug_assert!(id < self.count);
        unsafe { &mut *self.ptr.as_ptr().add(id) }
    }

    /// # Safety
    ///
    /// `id` must be less than [`count`](PodArray::count).
    #[inline]
    pub unsafe fn set_unchecked(&mut self, id: usize, value: T) {
        debug_assert!(id < self.count);
        unsafe { self.ptr.as_ptr().add(id).write(value) }
    }

    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.as_slice().last()
    }

    #[inline]
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Forgets all elements. The buffer and capacity are kept.
    #[inline]
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Returns an independent array with the same elements and the same capacity.
    pub fn copy(&self) -> Self
    where
        A: Clone,
    {
        match self.try_copy() {
            Ok(array) => array,
            Err(e) => allocation_failure(e),
        }
    }

    /// Fallible version of [`copy`](PodArray::copy).
    pub fn try_copy(&self) -> Result<Self>
    where
        A: Clone,
    {
        let mut result = Self::new_in(self.alloc.clone());
        result.ptr = result.allocate_buffer(self.capacity)?;
        result.capacity = self.capacity;
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), result.ptr.as_ptr(), self.count);
        }
        result.count = self.count;
        log::trace!(
            "PodArray copy: {} live elements, {} slots",
            self.count,
            self.capacity
        );
        Ok(result)
    }

    /// Reverses the order of the live elements in place.
    pub fn reverse(&mut self) {
        self.as_mut_slice().reverse();
    }

    /// Calls `visitor` on every live element, in index order.
    pub fn each(&mut self, visitor: impl FnMut(&mut T)) {
        self.as_mut_slice().iter_mut().for_each(visitor);
    }

    /// Returns the buffer to the allocator and resets the array to the empty state.
    ///
    /// Calling `release` again, or dropping the array afterwards, is a no-op.
    pub fn release(&mut self) {
        unsafe { self.free_buffer() };
        self.ptr = NonNull::dangling();
        self.count = 0;
        self.capacity = 0;
    }

    /// Strided view over one field of every element.
    ///
    /// ```
    /// use podkit_array::PodArray;
    ///
    /// let pairs = PodArray::from_slice(&[[1u32, 10], [2, 20], [3, 30]]);
    /// let second = pairs.view(|p| &p[1]).unwrap();
    /// assert_eq!(second.copy_deinterlace().as_slice(), &[10, 20, 30]);
    /// ```
    pub fn view<F: Pod>(&self, field: impl FnOnce(&T) -> &F) -> Result<StridedView<'_, F>>
    where
        T: Pod,
    {
        StridedView::from_field(self.as_slice(), field)
    }

    /// Mutable strided view over one field of every element.
    pub fn view_mut<F: Pod>(
        &mut self,
        field: impl FnOnce(&T) -> &F,
    ) -> Result<StridedViewMut<'_, F>>
    where
        T: Pod,
    {
        StridedViewMut::from_field(self.as_mut_slice(), field)
    }

    /// Writes `item` past the last element.
    ///
    /// # Safety
    ///
    /// `count` must be less than `capacity`.
    #[inline]
    pub(crate) unsafe fn push_unchecked(&mut self, item: T) {
        debug_assert!(self.count < self.capacity);
        unsafe { self.ptr.as_ptr().add(self.count).write(item) };
        self.count += 1;
    }

    fn allocate_buffer(&self, capacity: usize) -> Result<NonNull<T>> {
        let layout = Layout::array::<T>(capacity)
            .map_err(|_| Error::capacity_overflow(capacity, mem::size_of::<T>()))?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        Ok(self.alloc.allocate(layout)?.cast())
    }

    /// Returns the current buffer to the allocator without touching the fields.
    ///
    /// # Safety
    ///
    /// The caller must replace `ptr` before the buffer is accessed again.
    unsafe fn free_buffer(&mut self) {
        if let Ok(layout) = Layout::array::<T>(self.capacity) {
            if layout.size() != 0 {
                unsafe { self.alloc.deallocate(self.ptr.cast(), layout) };
            }
        }
    }
}

#[inline]
fn grown_capacity(capacity: usize, min_capacity: usize) -> usize {
    capacity
        .checked_mul(2)
        .unwrap_or_else(|| capacity_overflow())
        .max(min_capacity)
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}

/// Terminates on an error from an infallible-looking operation, the way `Vec` does.
#[cold]
pub(crate) fn allocation_failure(e: Error) -> ! {
    if let ErrorKind::AllocationFailed { size, align } = *e.kind() {
        if let Ok(layout) = Layout::from_size_align(size, align) {
            std::alloc::handle_alloc_error(layout);
        }
    }
    panic!("{e}");
}

impl<T: Copy, A: RawAlloc> Drop for PodArray<T, A> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Copy, A: RawAlloc> Deref for PodArray<T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy, A: RawAlloc> DerefMut for PodArray<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy, A: RawAlloc, I: SliceIndex<[T]>> Index<I> for PodArray<T, A> {
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &I::Output {
        &self.as_slice()[index]
    }
}

impl<T: Copy, A: RawAlloc, I: SliceIndex<[T]>> IndexMut<I> for PodArray<T, A> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut I::Output {
        &mut self.as_mut_slice()[index]
    }
}

impl<T: Copy, A: RawAlloc> AsRef<[T]> for PodArray<T, A> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy, A: RawAlloc> AsMut<[T]> for PodArray<T, A> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy, A: RawAlloc + Clone> Clone for PodArray<T, A> {
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl<T: Copy, A: RawAlloc + Default> Default for PodArray<T, A> {
    fn default() -> Self {
        PodArray::new_in(A::default())
    }
}

impl<T: Copy + fmt::Debug, A: RawAlloc> fmt::Debug for PodArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PodArray")
            .field("count", &self.count)
            .field("capacity", &self.capacity)
            .field("items", &self.as_slice())
            .finish()
    }
}

impl<T, A, B> PartialEq<PodArray<T, B>> for PodArray<T, A>
where
    T: Copy + PartialEq,
    A: RawAlloc,
    B: RawAlloc,
{
    fn eq(&self, other: &PodArray<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Copy + Eq, A: RawAlloc> Eq for PodArray<T, A> {}

impl<T: Copy, A: RawAlloc> Extend<T> for PodArray<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for item in iter {
            self.add(item);
        }
    }
}

impl<T: Copy> FromIterator<T> for PodArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = PodArray::new();
        array.extend(iter);
        array
    }
}

impl<T: Copy> From<&[T]> for PodArray<T> {
    fn from(values: &[T]) -> Self {
        PodArray::from_slice(values)
    }
}

impl<'a, T: Copy, A: RawAlloc> IntoIterator for &'a PodArray<T, A> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T: Copy, A: RawAlloc> IntoIterator for &'a mut PodArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use podkit_alloc::CountingAlloc;

    use super::*;

    fn counted() -> (PodArray<u32, CountingAlloc>, CountingAlloc) {
        let alloc = CountingAlloc::new();
        (PodArray::new_in(alloc.clone()), alloc)
    }

    #[test]
    fn test_new_is_empty_and_unallocated() {
        let (array, alloc) = counted();
        assert!(array.is_empty());
        assert_eq!(array.count(), 0);
        assert_eq!(array.capacity(), 0);
        assert_eq!(array.as_slice(), &[] as &[u32]);
        assert_eq!(alloc.stats().allocations(), 0);
    }

    #[test]
    fn test_default_is_zero_state() {
        let array = PodArray::<u64>::default();
        assert_eq!(array.count(), 0);
        assert_eq!(array.capacity(), 0);
        assert!(array.last().is_none());
    }

    #[test]
    fn test_add_growth_sequence() {
        let mut array = PodArray::<u32>::new();
        let mut capacities = Vec::new();
        for i in 0..10 {
            assert_eq!(array.add(i), i as usize);
            capacities.push(array.capacity());
        }
        // Growth happens once count + 1 reaches capacity.
        assert_eq!(capacities, vec![4, 4, 4, 8, 8, 8, 8, 16, 16, 16]);
        assert_eq!(array.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_add_to_full_array_doubles() {
        let mut array = PodArray::<u32>::with_capacity(4);
        array.insert(0, 1);
        array.insert(1, 2);
        array.insert(2, 3);
        array.insert(3, 4);
        assert_eq!((array.count(), array.capacity()), (4, 4));

        assert_eq!(array.add(5), 4);
        assert_eq!(array.capacity(), 8);
        assert_eq!(array.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_insert_growth_starts_at_one() {
        let mut array = PodArray::<u32>::new();
        array.insert(0, 7);
        assert_eq!(array.capacity(), 1);
        array.insert(0, 6);
        assert_eq!(array.capacity(), 2);
        array.insert(2, 8);
        assert_eq!(array.capacity(), 4);
        assert_eq!(array.as_slice(), &[6, 7, 8]);
    }

    #[test]
    fn test_insert_shifts_tail() {
        let mut array = PodArray::from_slice(&[10, 20, 30]);
        array.insert(0, 5);
        assert_eq!(array.as_slice(), &[5, 10, 20, 30]);
        array.insert(2, 15);
        assert_eq!(array.as_slice(), &[5, 10, 15, 20, 30]);
        array.insert(5, 35);
        assert_eq!(array.as_slice(), &[5, 10, 15, 20, 30, 35]);
    }

    #[test]
    #[should_panic(expected = "insertion index (is 4) should be <= count (is 3)")]
    fn test_insert_past_end_panics() {
        let mut array = PodArray::from_slice(&[1, 2, 3]);
        array.insert(4, 0);
    }

    #[test]
    fn test_remove_shifts_and_keeps_capacity() {
        let mut array = PodArray::from_slice(&[1, 2, 3, 4]);
        let capacity = array.capacity();
        assert_eq!(array.remove(1), 2);
        assert_eq!(array.as_slice(), &[1, 3, 4]);
        assert_eq!(array.remove(2), 4);
        assert_eq!(array.as_slice(), &[1, 3]);
        assert_eq!(array.capacity(), capacity);
    }

    #[test]
    #[should_panic(expected = "removal index (is 2) should be < count (is 2)")]
    fn test_remove_at_count_panics() {
        let mut array = PodArray::from_slice(&[1, 2]);
        array.remove(2);
    }

    #[test]
    fn test_pop() {
        let mut array = PodArray::from_slice(&[1, 2, 3]);
        assert_eq!(array.pop(), 3);
        assert_eq!(array.pop(), 2);
        assert_eq!(array.as_slice(), &[1]);
    }

    #[test]
    #[should_panic(expected = "pop called on an empty PodArray")]
    fn test_pop_empty_panics() {
        let mut array = PodArray::<u8>::new();
        array.pop();
    }

    #[test]
    fn test_resize_grow_preserves_elements() {
        let mut array = PodArray::from_slice(&[1u16, 2, 3]);
        array.resize(100);
        assert_eq!(array.capacity(), 100);
        assert_eq!(array.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_resize_shrink_truncates() {
        let mut array = PodArray::from_slice(&[1u16, 2, 3, 4, 5]);
        array.resize(2);
        assert_eq!(array.capacity(), 2);
        assert_eq!(array.as_slice(), &[1, 2]);

        array.resize(0);
        assert_eq!(array.capacity(), 0);
        assert!(array.is_empty());
    }

    #[test]
    fn test_resize_always_reallocates() {
        let (mut array, alloc) = counted();
        array.resize(8);
        array.add(1);
        let before = array.as_ptr();
        array.resize(8);
        assert_eq!(alloc.stats().allocations(), 2);
        assert_eq!(alloc.stats().deallocations(), 1);
        assert_eq!(alloc.stats().live_allocations(), 1);
        assert_eq!(array.as_slice(), &[1]);
        // The old block is freed only after the new one is allocated.
        assert_ne!(before, array.as_ptr());
    }

    #[test]
    fn test_try_resize_overflow_leaves_array_intact() {
        let mut array = PodArray::from_slice(&[1u64, 2]);
        let e = array.try_resize(usize::MAX).unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::CapacityOverflow { .. }));
        assert_eq!(array.as_slice(), &[1, 2]);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn test_resize_overflow_panics() {
        let mut array = PodArray::<u64>::new();
        array.resize(usize::MAX);
    }

    #[test]
    fn test_get_set_index() {
        let mut array = PodArray::from_slice(&[1, 2, 3]);
        assert_eq!(array.get(1), Some(&2));
        assert_eq!(array.get(3), None);
        array.set(1, 20);
        array[2] = 30;
        *array.get_mut(0).unwrap() = 10;
        assert_eq!(array.as_slice(), &[10, 20, 30]);
        assert_eq!(array[1], 20);
        assert_eq!(&array[1..], &[20, 30]);
    }

    #[test]
    fn test_range_index() {
        let mut array: PodArray<u32> = (0..6).collect();
        assert_eq!(&array[..2], &[0, 1]);
        assert_eq!(&array[2..4], &[2, 3]);
        assert_eq!(&array[4..=5], &[4, 5]);
        assert_eq!(array[..].len(), 6);

        array[1..3].copy_from_slice(&[10, 20]);
        array[4..].fill(7);
        assert_eq!(array.as_slice(), &[0, 10, 20, 3, 7, 7]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_range_index_past_count_panics() {
        let array = PodArray::<u8>::with_capacity(8);
        let _tail: &[u8] = &array[..4];
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_set_out_of_bounds_panics() {
        let mut array = PodArray::from_slice(&[1, 2, 3]);
        array.set(3, 0);
    }

    #[test]
    fn test_unchecked_access() {
        let mut array = PodArray::from_slice(&[1, 2, 3]);
        unsafe {
            array.set_unchecked(0, 9);
            *array.get_unchecked_mut(1) += 10;
            assert_eq!(*array.get_unchecked(0), 9);
            assert_eq!(*array.get_unchecked(1), 12);
        }
    }

    #[test]
    fn test_last() {
        let mut array = PodArray::<i32>::new();
        assert!(array.last().is_none());
        array.add(1);
        array.add(2);
        assert_eq!(array.last(), Some(&2));
        *array.last_mut().unwrap() = 5;
        assert_eq!(array.as_slice(), &[1, 5]);
    }

    #[test]
    fn test_clear_keeps_buffer() {
        let (mut array, alloc) = counted();
        array.extend_from_slice(&[1, 2, 3]);
        let capacity = array.capacity();
        array.clear();
        assert!(array.is_empty());
        assert_eq!(array.capacity(), capacity);
        assert_eq!(alloc.stats().live_allocations(), 1);
    }

    #[test]
    fn test_copy_is_independent() {
        let (mut array, alloc) = counted();
        array.extend_from_slice(&[1, 2, 3]);
        array.resize(10);

        let mut copy = array.copy();
        assert_eq!(copy.count(), 3);
        assert_eq!(copy.capacity(), 10);
        assert_eq!(copy, array);
        assert_ne!(copy.as_ptr(), array.as_ptr());
        assert_eq!(alloc.stats().live_allocations(), 2);

        copy[0] = 100;
        array[1] = 200;
        assert_eq!(array.as_slice(), &[1, 200, 3]);
        assert_eq!(copy.as_slice(), &[100, 2, 3]);
    }

    #[test]
    fn test_copy_of_empty_array_does_not_allocate() {
        let (array, alloc) = counted();
        let copy = array.clone();
        assert!(copy.is_empty());
        assert_eq!(copy.capacity(), 0);
        assert_eq!(alloc.stats().allocations(), 0);
    }

    #[test]
    fn test_reverse() {
        let mut array = PodArray::from_slice(&[1, 2, 3, 4, 5]);
        array.reverse();
        assert_eq!(array.as_slice(), &[5, 4, 3, 2, 1]);
        array.reverse();
        assert_eq!(array.as_slice(), &[1, 2, 3, 4, 5]);

        let mut even = PodArray::from_slice(&[1, 2]);
        even.reverse();
        assert_eq!(even.as_slice(), &[2, 1]);
    }

    #[test]
    fn test_each_mutates_in_place() {
        let mut array = PodArray::from_slice(&[1, 2, 3]);
        let mut visited = Vec::new();
        array.each(|v| {
            visited.push(*v);
            *v *= 10;
        });
        assert_eq!(visited, vec![1, 2, 3]);
        assert_eq!(array.as_slice(), &[10, 20, 30]);
    }

    #[test]
    fn test_release_resets_and_is_idempotent() {
        let (mut array, alloc) = counted();
        array.extend_from_slice(&[1, 2, 3]);
        array.release();
        assert_eq!((array.count(), array.capacity()), (0, 0));
        assert_eq!(alloc.stats().deallocations(), 1);

        array.release();
        drop(array);
        assert_eq!(alloc.stats().deallocations(), 1);
        assert_eq!(alloc.stats().live_bytes(), 0);
    }

    #[test]
    fn test_array_is_reusable_after_release() {
        let mut array = PodArray::from_slice(&[1, 2]);
        array.release();
        array.add(3);
        assert_eq!(array.as_slice(), &[3]);
    }

    #[test]
    fn test_drop_frees_buffer() {
        let alloc = CountingAlloc::new();
        {
            let mut array = PodArray::<u64, _>::new_in(alloc.clone());
            array.extend(0..100);
            assert_eq!(alloc.stats().live_allocations(), 1);
        }
        assert_eq!(alloc.stats().live_allocations(), 0);
    }

    #[test]
    fn test_zero_sized_elements() {
        let mut array = PodArray::<(), CountingAlloc>::default();
        for _ in 0..10 {
            array.add(());
        }
        array.insert(3, ());
        assert_eq!(array.count(), 11);
        array.remove(0);
        assert_eq!(array.count(), 10);
        assert_eq!(array.allocator().stats().allocations(), 0);
    }

    #[test]
    fn test_sort_through_slice() {
        let mut array: PodArray<i32> = [5, 3, 9, 1].into_iter().collect();
        array.sort_unstable();
        assert_eq!(array.as_slice(), &[1, 3, 5, 9]);
        assert_eq!(array.binary_search(&5), Ok(2));
    }

    #[test]
    fn test_debug_format() {
        let array = PodArray::from_slice(&[1, 2]);
        let text = format!("{array:?}");
        assert!(text.starts_with("PodArray { count: 2, capacity: "));
        assert!(text.ends_with("items: [1, 2] }"));
    }
}
