use alloc::alloc::{alloc_zeroed, dealloc};
use core::alloc::Layout;
use core::hash::{BuildHasher, Hash, Hasher};
use core::ptr::NonNull;

use crate::error::Error;

/// Allocates `count` zeroed cells. The all-zero bit pattern must be a valid
/// "empty" state for `T`.
pub(crate) fn allocate_zeroed<T>(count: usize) -> Result<NonNull<T>, Error> {
    let layout = Layout::array::<T>(count).map_err(|_| Error::CapacityOverflow(count))?;
    debug_assert!(layout.size() > 0);
    let ptr = unsafe { alloc_zeroed(layout) };
    NonNull::new(ptr.cast::<T>()).ok_or(Error::AllocationFailure(layout.size()))
}

/// # Safety
/// `ptr` must have been returned by [`allocate_zeroed`] with the same `T`
/// and `count`, and must not have been deallocated already.
pub(crate) unsafe fn deallocate<T>(ptr: NonNull<T>, count: usize) {
    let layout = Layout::array::<T>(count).unwrap();
    dealloc(ptr.as_ptr().cast::<u8>(), layout);
}

/// Hashes `key` through the container's injected hash builder.
pub(crate) fn hash_of<S, Q>(hash_builder: &S, key: &Q) -> u64
where
    S: BuildHasher,
    Q: Hash + ?Sized,
{
    let mut hasher = hash_builder.build_hasher();
    key.hash(&mut hasher);
    hasher.finish()
}
