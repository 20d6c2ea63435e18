//! Destruction actions for exclusively owned objects.
//!
//! A [`Deleter`] is paired with a pointer in a [`Unique`](crate::Unique) and
//! moved along with it into a [`SmartHolder`](crate::SmartHolder). The holder
//! runs it exactly once, when the last handle to the object goes away, unless
//! ownership has been released back to the caller first.
//!
//! Besides the two built-in deleters, any `unsafe fn(NonNull<T>)` can be
//! used as a deleter:
//!
//! ```
//! use core::ptr::NonNull;
//!
//! use smartholder::{SmartHolder, Unique};
//!
//! unsafe fn free(ptr: NonNull<u64>) {
//!     // SAFETY: The pointer came from `Box::into_raw`
//!     drop(unsafe { Box::from_raw(ptr.as_ptr()) });
//! }
//!
//! let ptr = NonNull::from(Box::leak(Box::new(5u64)));
//! let deleter: unsafe fn(NonNull<u64>) = free;
//! // SAFETY: `free` is entitled to destroy the leaked box
//! let unique = unsafe { Unique::from_raw_parts(ptr, deleter) };
//!
//! let mut holder: SmartHolder = SmartHolder::new();
//! holder.acquire_owned_custom(unique);
//! assert_eq!(*holder.borrow::<u64>().unwrap(), 5);
//! ```

use alloc::boxed::Box;
use core::ptr::NonNull;

pub use smartholder_internals::deleter::Deleter;

/// The default destruction action: reconstructs the [`Box`] the object was
/// allocated in and drops it.
///
/// This is the deleter used by [`Unique::from_box`](crate::Unique::from_box)
/// and by the default-destruction acquisition path of the holder.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct DefaultDelete;

impl<T: 'static> Deleter<T> for DefaultDelete {
    #[inline]
    unsafe fn delete(self, ptr: NonNull<T>) {
        // SAFETY: `DefaultDelete` is only paired with pointers that came from
        // `Box::into_raw` (guaranteed by the caller), and the object is not
        // accessed afterwards.
        let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };
        core::mem::drop(boxed);
    }
}

/// A destruction action that leaves the object alone.
///
/// Useful for objects whose storage is managed elsewhere, such as statics or
/// objects owned by a foreign runtime.
///
/// ```
/// use core::ptr::NonNull;
///
/// use smartholder::{NoDelete, Unique};
///
/// let ptr = NonNull::from(Box::leak(Box::new(7u32)));
///
/// // SAFETY: `NoDelete` never destroys anything, and nobody else touches `ptr`
/// let unique = unsafe { Unique::from_raw_parts(ptr, NoDelete) };
/// assert_eq!(*unique, 7);
/// drop(unique);
///
/// // The allocation is still ours
/// // SAFETY: The pointer came from `Box::leak`
/// drop(unsafe { Box::from_raw(ptr.as_ptr()) });
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct NoDelete;

impl<T: 'static> Deleter<T> for NoDelete {
    #[inline]
    unsafe fn delete(self, _ptr: NonNull<T>) {}
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    static DROPS: AtomicUsize = AtomicUsize::new(0);

    struct Tracked;

    impl Drop for Tracked {
        fn drop(&mut self) {
            DROPS.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_builtin_deleters() {
        let ptr = NonNull::from(Box::leak(Box::new(Tracked)));

        // SAFETY: `NoDelete` does not touch the pointee
        unsafe { NoDelete.delete(ptr) };
        assert_eq!(DROPS.load(Ordering::SeqCst), 0);

        // SAFETY: The pointer came from `Box::leak` and is not used afterwards
        unsafe { DefaultDelete.delete(ptr) };
        assert_eq!(DROPS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deleters_are_thread_safe() {
        static_assertions::assert_impl_all!(DefaultDelete: Send, Sync, Copy);
        static_assertions::assert_impl_all!(NoDelete: Send, Sync, Copy);
        static_assertions::assert_eq_size!(DefaultDelete, ());
    }
}
