//! This module encapsulates the fields of the [`HandleData`] and its
//! [`HandleHeader`]. Since this is the only place they are visible, this means
//! that the type of the [`HandleVtable`] is guaranteed to always be in sync
//! with the types of the actual pointee and deleter. This follows from the
//! fact that they are in sync when created and that the API offers no way to
//! change the [`HandleVtable`], the pointee type or the deleter type after
//! creation.
//!
//! This module also contains the guarded destruction action: the [`Drop`]
//! implementation of [`HandleData`] consults the `armed` flag immediately
//! before invoking the deleter, so a handle that has been disarmed never
//! destroys its pointee.

use core::{
    any::TypeId,
    marker::PhantomData,
    ptr::NonNull,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    deleter::Deleter,
    handle::{
        raw::{RawHandle, RawHandleRef},
        vtable::HandleVtable,
    },
};

/// The part of a [`HandleData`] that does not depend on the pointee or
/// deleter type.
///
/// Since [`HandleData`] is `#[repr(C)]` and the header is its first field, a
/// pointer to any `HandleData<T, D>` is also a valid pointer to its header.
#[repr(C)]
pub(super) struct HandleHeader {
    /// The vtable of this handle
    vtable: &'static HandleVtable,
    /// Whether the deleter is still entitled to run when the last reference
    /// to this handle is dropped
    armed: AtomicBool,
    /// The tracked object, with its type erased
    pointee: NonNull<()>,
}

/// Type-erased handle control block with vtable-based dispatch.
///
/// This struct uses `#[repr(C)]` to enable safe access to the
/// [`HandleHeader`] in type-erased contexts, even when the concrete pointee
/// type `T` and deleter type `D` are unknown.
#[repr(C)]
pub(super) struct HandleData<T: 'static, D: Deleter<T>> {
    /// The type-independent header
    header: HandleHeader,
    /// The destruction action. Only `None` after it has been handed back to
    /// the caller or invoked.
    deleter: Option<D>,
    /// Marker to tell the compiler that we logically own a `T`
    _pointee: PhantomData<T>,
}

impl<T: 'static, D: Deleter<T>> HandleData<T, D> {
    /// Creates a new [`HandleData`] tracking `pointee` with the specified
    /// deleter.
    ///
    /// This method creates the vtable for type-erased dispatch and pairs it
    /// with the handle data. When `armed` is false the deleter will never be
    /// invoked.
    #[inline]
    pub(super) fn new(pointee: NonNull<T>, deleter: D, armed: bool) -> Self {
        Self {
            header: HandleHeader {
                vtable: HandleVtable::new::<T, D>(),
                armed: AtomicBool::new(armed),
                pointee: pointee.cast::<()>(),
            },
            deleter: Some(deleter),
            _pointee: PhantomData,
        }
    }
}

impl<T: 'static, D: Deleter<T>> Drop for HandleData<T, D> {
    fn drop(&mut self) {
        // Only `try_into_parts` clears the flag, and it holds the last reference
        // while doing so.
        if !*self.header.armed.get_mut() {
            return;
        }

        if let Some(deleter) = self.deleter.take() {
            let pointee = self.header.pointee.cast::<T>();

            // SAFETY:
            // 1. The handle was armed, which means that whoever created it handed the
            //    right to destroy `pointee` to this deleter, and nobody has released
            //    ownership since (`try_into_parts` clears the flag).
            // 2. This is the last reference to the handle, so nobody else can access the
            //    pointee through it afterwards.
            unsafe { deleter.delete(pointee) }
        }
    }
}

impl RawHandle {
    /// Disarms the handle and hands the pointee and the deleter back to the
    /// caller.
    ///
    /// Returns the handle unchanged if it is not the only reference to the
    /// underlying [`HandleData`].
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The types `T` and `D` match the actual pointee and deleter types
    ///    stored in the [`HandleData`].
    pub unsafe fn try_into_parts<T: 'static, D: Deleter<T>>(
        self,
    ) -> Result<(NonNull<T>, D), RawHandle> {
        debug_assert_eq!(self.as_ref().pointee_type_id(), TypeId::of::<T>());
        debug_assert_eq!(self.as_ref().deleter_type_id(), TypeId::of::<D>());

        let ptr: *const HandleData<T, D> =
            self.into_non_null().cast::<HandleData<T, D>>().as_ptr();

        // SAFETY:
        // 1. The pointer came from `Arc::into_raw` (guaranteed by the invariants of
        //    `RawHandle`) and has the correct type (guaranteed by the caller).
        // 2. We consumed `self` without decrementing the count, so the `Arc` we
        //    rebuild here takes over that reference.
        let arc: triomphe::Arc<HandleData<T, D>> = unsafe { triomphe::Arc::from_raw(ptr) };

        match triomphe::Arc::try_unique(arc) {
            Ok(mut unique) => {
                *unique.header.armed.get_mut() = false;
                let pointee = unique.header.pointee.cast::<T>();
                match unique.deleter.take() {
                    Some(deleter) => Ok((pointee, deleter)),
                    None => unreachable!("the deleter is only taken when the handle is consumed"),
                }
            }
            Err(arc) => Err(RawHandle::from_arc(arc)),
        }
    }
}

impl<'a> RawHandleRef<'a> {
    /// Returns a reference to the [`HandleHeader`] of the [`HandleData`]
    /// instance.
    #[inline]
    fn header(self) -> &'a HandleHeader {
        let ptr: *const HandleHeader = self.as_ptr();

        // SAFETY: We don't know the actual pointee or deleter type, but we do know
        // that it points to an instance of `HandleData<T, D>` for some specific `T`
        // and `D`. Since `HandleData<T, D>` is `#[repr(C)]` with the header as its
        // first field, the pointer is also a valid pointer to an initialized
        // `HandleHeader`. The header is only mutated through the `AtomicBool`, so a
        // shared reference is valid for as long as the handle is alive, which is
        // at least `'a`.
        unsafe { &*ptr }
    }

    /// Returns a reference to the [`HandleVtable`] of the [`HandleData`]
    /// instance.
    #[inline]
    pub(super) fn vtable(self) -> &'static HandleVtable {
        self.header().vtable
    }

    /// Returns the address of the tracked object.
    #[inline]
    pub fn pointee_ptr(self) -> NonNull<()> {
        self.header().pointee
    }

    /// Accesses the tracked object as a reference to the specified type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The type `T` matches the actual pointee type stored in the
    ///    [`HandleData`].
    /// 2. The pointee is still alive for the lifetime `'a`. For handles that
    ///    were armed at creation this holds until the handle is released; for
    ///    handles created disarmed it is the creator's responsibility.
    #[inline]
    pub unsafe fn pointee_downcast_unchecked<T: 'static>(self) -> &'a T {
        debug_assert_eq!(self.pointee_type_id(), TypeId::of::<T>());

        let pointee = self.header().pointee.cast::<T>();

        // SAFETY:
        // 1. The type matches, guaranteed by the caller.
        // 2. The pointee is alive for `'a`, guaranteed by the caller.
        unsafe { pointee.as_ref() }
    }

    /// Whether the deleter will run when the last reference to the handle is
    /// dropped.
    #[inline]
    pub fn is_armed(self) -> bool {
        self.header().armed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopDeleter;
    impl<T: 'static> Deleter<T> for NoopDeleter {
        unsafe fn delete(self, _ptr: NonNull<T>) {}
    }

    #[test]
    fn test_handle_data_field_offsets() {
        use core::mem::offset_of;

        fn check<T: 'static>() {
            assert_eq!(offset_of!(HandleData<T, NoopDeleter>, header), 0);
        }

        #[repr(align(32))]
        struct LargeAlignment {
            _value: u8,
        }

        check::<u8>();
        check::<i32>();
        check::<[u64; 4]>();
        check::<LargeAlignment>();

        assert_eq!(offset_of!(HandleHeader, vtable), 0);
    }

    #[test]
    fn test_disarmed_data_skips_deleter() {
        use core::sync::atomic::AtomicUsize;

        static DELETED: AtomicUsize = AtomicUsize::new(0);

        struct Counting;
        impl Deleter<u32> for Counting {
            unsafe fn delete(self, _ptr: NonNull<u32>) {
                DELETED.fetch_add(1, Ordering::SeqCst);
            }
        }

        let mut value = 5u32;
        let data = HandleData::new(NonNull::from(&mut value), Counting, false);
        drop(data);
        assert_eq!(DELETED.load(Ordering::SeqCst), 0);

        let data = HandleData::new(NonNull::from(&mut value), Counting, true);
        drop(data);
        assert_eq!(DELETED.load(Ordering::SeqCst), 1);
    }
}
