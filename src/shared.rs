use alloc::boxed::Box;
use core::{fmt, ops, ptr::NonNull};

use smartholder_internals::RawHandle;

use crate::{
    deleters::{DefaultDelete, Deleter},
    markers::{self, Local, SendSync},
    unique::Unique,
};

mod limit_field_access {
    use core::marker::PhantomData;

    use smartholder_internals::{RawHandle, RawHandleRef};

    use crate::markers::SendSync;

    /// A reference-counted handle to an object tracked by a shared control
    /// block.
    ///
    /// Cloning a `Shared` increments the share count. The object is destroyed
    /// by its deleter when the last handle goes away, unless destruction was
    /// disarmed in the meantime.
    ///
    /// # Examples
    ///
    /// ```
    /// use smartholder::Shared;
    ///
    /// let a: Shared<String> = Shared::new(String::from("hello"));
    /// let b = a.clone();
    ///
    /// assert_eq!(a.share_count(), 2);
    /// assert!(Shared::ptr_eq(&a, &b));
    /// assert_eq!(*b, "hello");
    /// ```
    #[repr(transparent)]
    pub struct Shared<T: 'static, ThreadSafety: 'static = SendSync> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. The pointee type of the handle is `T`.
        /// 2. The pointee stays alive for as long as the handle exists.
        /// 3. If `ThreadSafety = SendSync`, then the pointee and the deleter
        ///    of the handle are `Send + Sync`.
        raw: RawHandle,
        _pointee: PhantomData<T>,
        _thread_safety: PhantomData<ThreadSafety>,
    }

    impl<T: 'static, TS> Shared<T, TS> {
        /// Creates a new [`Shared`] from a [`RawHandle`].
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. The pointee type of the handle is `T`.
        /// 2. The pointee stays alive for as long as the handle exists.
        /// 3. If `TS = SendSync`, then the pointee and the deleter of the
        ///    handle are `Send + Sync`.
        #[must_use]
        pub(crate) unsafe fn from_raw(raw: RawHandle) -> Self {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
            // 3. Guaranteed by the caller
            Self {
                raw,
                _pointee: PhantomData,
                _thread_safety: PhantomData,
            }
        }

        #[must_use]
        pub(crate) fn into_raw(self) -> RawHandle {
            // SAFETY: We are destroying `self`, so we no longer
            // need to uphold any safety invariants.
            self.raw
        }

        #[must_use]
        pub(crate) fn as_raw_ref(&self) -> RawHandleRef<'_> {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Upheld, as the handle is not changed.
            // 2. Upheld, as the handle is not changed.
            // 3. Upheld, as the handle is not changed.
            self.raw.as_ref()
        }
    }
}

pub use limit_field_access::Shared;

impl<T: 'static, TS> Shared<T, TS> {
    /// Moves `value` to the heap and tracks it with [`DefaultDelete`].
    #[must_use]
    pub fn new(value: T) -> Self
    where
        T: markers::ObjectMarkerFor<TS>,
    {
        Self::from_box(Box::new(value))
    }

    /// Tracks an already boxed object with [`DefaultDelete`].
    #[must_use]
    pub fn from_box(value: Box<T>) -> Self
    where
        T: markers::ObjectMarkerFor<TS>,
    {
        let ptr = NonNull::from(Box::leak(value));

        // SAFETY: Ownership of the leaked box is transferred to the handle,
        // and `DefaultDelete` frees boxed objects.
        let raw = unsafe { RawHandle::new(ptr, DefaultDelete, true) };

        // SAFETY:
        // 1. The handle was just created with pointee type `T`.
        // 2. The handle is armed and owns the pointee exclusively.
        // 3. Guaranteed by the `ObjectMarkerFor<TS>` bound on `T`, and
        //    `DefaultDelete` is `Send + Sync`.
        unsafe { Self::from_raw(raw) }
    }

    /// Moves an exclusively owned object into shared ownership, keeping its
    /// deleter.
    ///
    /// ```
    /// use core::ptr::NonNull;
    ///
    /// use smartholder::{Shared, Unique};
    ///
    /// unsafe fn free(ptr: NonNull<i32>) {
    ///     // SAFETY: The pointer came from `Box::into_raw`
    ///     drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    /// }
    ///
    /// let ptr = NonNull::from(Box::leak(Box::new(-4)));
    /// let deleter: unsafe fn(NonNull<i32>) = free;
    /// // SAFETY: `free` is entitled to destroy the leaked box
    /// let unique = unsafe { Unique::from_raw_parts(ptr, deleter) };
    ///
    /// let shared: Shared<i32> = Shared::from_unique(unique);
    /// assert_eq!(*shared, -4);
    /// assert_eq!(shared.as_ptr(), ptr);
    /// ```
    #[must_use]
    pub fn from_unique<D>(value: Unique<T, D>) -> Self
    where
        T: markers::ObjectMarkerFor<TS>,
        D: Deleter<T> + markers::ObjectMarkerFor<TS>,
    {
        let (ptr, deleter) = value.into_raw_parts();

        // SAFETY: `Unique` guarantees the pointee is alive and that `deleter`
        // may destroy it, and ownership has just been released to us.
        let raw = unsafe { RawHandle::new(ptr, deleter, true) };

        // SAFETY:
        // 1. The handle was just created with pointee type `T`.
        // 2. The handle is armed and nobody else owns the pointee, so it lives
        //    until the handle destroys it.
        // 3. Guaranteed by the `ObjectMarkerFor<TS>` bounds on `T` and `D`.
        unsafe { Self::from_raw(raw) }
    }

    /// Returns the number of handles that currently share the object.
    ///
    /// This includes handles held by [`SmartHolder`](crate::SmartHolder)s.
    #[must_use]
    pub fn share_count(&self) -> usize {
        self.as_raw_ref().strong_count()
    }

    /// Returns the address of the tracked object.
    #[must_use]
    pub fn as_ptr(&self) -> NonNull<T> {
        self.as_raw_ref().pointee_ptr().cast::<T>()
    }

    /// Returns true if both handles share the same control block.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.as_raw_ref().ptr_eq(other.as_raw_ref())
    }

    /// Returns true while the last handle to go away will still destroy the
    /// object.
    ///
    /// This is false for objects borrowed through
    /// [`SmartHolder::acquire_unowned`](crate::SmartHolder::acquire_unowned).
    #[must_use]
    pub fn is_destruction_live(&self) -> bool {
        self.as_raw_ref().is_armed()
    }

    /// Returns the [`core::any::type_name`] of the deleter that will destroy
    /// the object.
    #[must_use]
    pub fn deleter_type_name(&self) -> &'static str {
        self.as_raw_ref().deleter_type_name()
    }
}

impl<T: 'static> Shared<T, SendSync> {
    /// Forgets that the tracked object is `Send + Sync`.
    ///
    /// The returned handle can be acquired into a `SmartHolder<Local>`.
    ///
    /// ```
    /// use smartholder::{Shared, markers::Local};
    ///
    /// let shared: Shared<u8> = Shared::new(1);
    /// let local: Shared<u8, Local> = shared.into_local();
    /// assert_eq!(local.share_count(), 1);
    /// ```
    #[must_use]
    pub fn into_local(self) -> Shared<T, Local> {
        let raw = self.into_raw();

        // SAFETY:
        // 1. This is guaranteed by the invariants of this type.
        // 2. This is guaranteed by the invariants of this type.
        // 3. `TS=Local`, so this is trivially upheld.
        unsafe { Shared::<T, Local>::from_raw(raw) }
    }
}

impl<T: 'static, TS> Clone for Shared<T, TS> {
    fn clone(&self) -> Self {
        let raw = self.as_raw_ref().clone_arc();

        // SAFETY: The clone refers to the same control block, so the invariants
        // carry over from `self`.
        unsafe { Self::from_raw(raw) }
    }
}

impl<T: 'static, TS> ops::Deref for Shared<T, TS> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY:
        // 1. The pointee type is `T`, guaranteed by the invariants of this type.
        // 2. The pointee is alive while `self` exists, guaranteed by the
        //    invariants of this type.
        unsafe { self.as_raw_ref().pointee_downcast_unchecked::<T>() }
    }
}

impl<T: 'static + fmt::Debug, TS> fmt::Debug for Shared<T, TS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: 'static + fmt::Display, TS> fmt::Display for Shared<T, TS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T, TS> From<Box<T>> for Shared<T, TS>
where
    T: markers::ObjectMarkerFor<TS>,
{
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T, D, TS> From<Unique<T, D>> for Shared<T, TS>
where
    T: markers::ObjectMarkerFor<TS>,
    D: Deleter<T> + markers::ObjectMarkerFor<TS>,
{
    fn from(value: Unique<T, D>) -> Self {
        Self::from_unique(value)
    }
}

impl<T: 'static, TS> Unpin for Shared<T, TS> {}

// SAFETY: The `SendSync` marker indicates that the pointee and the deleter are
// `Send`+`Sync`. Therefore it is safe to implement `Send`+`Sync` for the handle
// itself.
unsafe impl<T: 'static> Send for Shared<T, SendSync> {}

// SAFETY: The `SendSync` marker indicates that the pointee and the deleter are
// `Send`+`Sync`. Therefore it is safe to implement `Send`+`Sync` for the handle
// itself.
unsafe impl<T: 'static> Sync for Shared<T, SendSync> {}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, string::String, vec::Vec};
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_clone_and_count() {
        let a: Shared<Vec<u8>> = Shared::new(alloc::vec![1, 2]);
        assert_eq!(a.share_count(), 1);
        assert!(a.is_destruction_live());

        let b = a.clone();
        assert_eq!(a.share_count(), 2);
        assert_eq!(a.as_ptr(), b.as_ptr());
        assert!(Shared::ptr_eq(&a, &b));

        core::mem::drop(b);
        assert_eq!(a.share_count(), 1);
        assert_eq!(*a, [1, 2]);
    }

    #[test]
    fn test_distinct_objects_are_not_ptr_eq() {
        let a: Shared<u32> = Shared::new(1);
        let b: Shared<u32> = Shared::new(1);
        assert!(!Shared::ptr_eq(&a, &b));
    }

    #[test]
    fn test_last_handle_destroys_once() {
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        let handles: Vec<Shared<Tracked>> = {
            let first = Shared::new(Tracked);
            (0..3).map(|_| first.clone()).collect()
        };
        assert_eq!(handles[0].share_count(), 3);
        assert_eq!(DROPS.load(Ordering::SeqCst), 0);

        core::mem::drop(handles);
        assert_eq!(DROPS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_local_handles_from_boxes() {
        let value = Rc::new(String::from("local"));
        let shared: Shared<Rc<String>, Local> = Shared::new(Rc::clone(&value));
        assert_eq!(Rc::strong_count(&value), 2);
        assert!(shared.deleter_type_name().ends_with("DefaultDelete"));

        let boxed: Shared<Rc<String>, Local> = Box::new(Rc::clone(&value)).into();
        assert_eq!(Rc::strong_count(&value), 3);
        assert!(boxed.is_destruction_live());

        core::mem::drop((shared, boxed));
        assert_eq!(Rc::strong_count(&value), 1);
    }

    #[test]
    fn test_deleter_type_name() {
        let shared: Shared<String> = Shared::new(String::new());
        assert!(shared.deleter_type_name().ends_with("DefaultDelete"));
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_impl_all!(Shared<String, SendSync>: Send, Sync, Clone, Unpin);
        static_assertions::assert_impl_all!(Shared<Rc<String>, SendSync>: Send, Sync);
        static_assertions::assert_not_impl_any!(Shared<String, Local>: Send, Sync);
        static_assertions::assert_not_impl_any!(Shared<String, SendSync>: Copy);
        static_assertions::assert_eq_size!(Shared<String>, usize);
    }
}
