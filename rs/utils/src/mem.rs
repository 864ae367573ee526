use std::mem::size_of;
use std::slice;

/// Reinterprets a typed slice as raw bytes, for bulk zero-copy writes to disk.
pub fn transmute_slice_to_u8<T>(data: &[T]) -> &[u8] {
    unsafe { slice::from_raw_parts(data.as_ptr() as *const u8, data.len() * size_of::<T>()) }
}

/// Reinterprets a raw byte slice as a typed slice, for bulk zero-copy reads
/// from disk. `data.len()` must be a multiple of `size_of::<T>()`.
pub fn transmute_u8_to_slice<T>(data: &[u8]) -> &[T] {
    assert_eq!(
        data.len() % size_of::<T>(),
        0,
        "byte slice length {} is not a multiple of element size {}",
        data.len(),
        size_of::<T>()
    );
    unsafe { slice::from_raw_parts(data.as_ptr() as *const T, data.len() / size_of::<T>()) }
}
