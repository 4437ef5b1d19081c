/// Checks if a number is aligned to the specified alignment boundary.
///
/// # Examples
///
/// ```
/// use podkit_alloc::align::is_aligned;
///
/// assert!(is_aligned(0, 4));
/// assert!(!is_aligned(6, 4));
/// assert!(is_aligned(12, 4));
/// // Any number is aligned to 1.
/// assert!(is_aligned(7, 1));
/// ```
///
/// # Panics
///
/// This function will panic in debug builds if `alignment` is not a power of 2.
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Checks if the address of `ptr` is a multiple of `alignment`.
///
/// # Examples
///
/// ```
/// use podkit_alloc::align::is_aligned_ptr;
///
/// let values = [0u32; 4];
/// assert!(is_aligned_ptr(values.as_ptr(), 4));
/// assert!(!is_aligned_ptr((values.as_ptr() as *const u8).wrapping_add(1), 2));
/// ```
#[inline]
pub fn is_aligned_ptr<T>(ptr: *const T, alignment: usize) -> bool {
    is_aligned(ptr as *const u8 as usize, alignment)
}
