//! Destruction actions for objects tracked by a [`RawHandle`].
//!
//! A deleter is the custom destruction action paired with an exclusively
//! owned pointer. When a handle is created, the deleter is moved into the
//! handle's control block and invoked at most once, when the last reference
//! to the handle is dropped and the handle has not been disarmed.
//!
//! [`RawHandle`]: crate::RawHandle

use core::ptr::NonNull;

/// Trait for destruction actions that can be paired with a pointer.
///
/// The deleter is consumed by [`delete`](Deleter::delete), so it runs at most
/// once. Deleters that are never invoked (for instance because ownership was
/// released back to the caller) are simply dropped.
///
/// The type of the deleter is part of the handle's identity: the holder
/// compares the deleter's type before handing a pointer back together with a
/// deleter of a specific type.
///
/// # Examples
///
/// ```
/// use core::ptr::NonNull;
///
/// use smartholder_internals::deleter::Deleter;
///
/// struct BoxDelete;
///
/// impl<T: 'static> Deleter<T> for BoxDelete {
///     unsafe fn delete(self, ptr: NonNull<T>) {
///         // SAFETY: The pointer came from `Box::into_raw` and is owned by us.
///         drop(unsafe { Box::from_raw(ptr.as_ptr()) });
///     }
/// }
/// ```
pub trait Deleter<T>: Sized + 'static {
    /// Destroys the object pointed to by `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live object that this deleter is entitled to
    ///    destroy, i.e. it was paired with this deleter when ownership was
    ///    taken.
    /// 2. The object is not accessed or destroyed by anyone else after this
    ///    call.
    unsafe fn delete(self, ptr: NonNull<T>);
}

impl<T: 'static> Deleter<T> for unsafe fn(NonNull<T>) {
    #[inline]
    unsafe fn delete(self, ptr: NonNull<T>) {
        // SAFETY:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { self(ptr) }
    }
}
