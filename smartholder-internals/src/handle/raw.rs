//! Type-erased handle pointer types.
//!
//! This module encapsulates the `ptr` field of [`RawHandle`] and
//! [`RawHandleRef`], ensuring it is only visible within this module. This
//! visibility restriction guarantees the safety invariant: **the pointer always
//! comes from `Arc<HandleData<T, D>>`**.
//!
//! # Safety Invariant
//!
//! Since the `ptr` field can only be set via [`RawHandle::new`] or
//! [`RawHandle::from_arc`] (which create it from `Arc::into_raw`), and cannot
//! be modified afterward (no `pub` or `pub(crate)` fields), the pointer
//! provenance remains valid throughout the value's lifetime.
//!
//! The [`RawHandle::drop`] implementation and reference counting operations
//! rely on this invariant to safely reconstruct the `Arc` and manage memory.
//!
//! # Type Erasure
//!
//! The concrete pointee type `T` and deleter type `D` are erased by casting to
//! a pointer to the type-independent [`HandleHeader`]. The vtable stored
//! within the header provides the runtime type information needed to safely
//! clone, count and drop the handle.

use core::{any::TypeId, ptr::NonNull};

use crate::{
    deleter::Deleter,
    handle::data::{HandleData, HandleHeader},
};

/// A pointer to a [`HandleData`] that is guaranteed to point to an initialized
/// instance of a [`HandleData<T, D>`] for some specific `T` and `D`, though we
/// do not know which.
///
/// However, the pointer is allowed to transition into a non-initialized state
/// inside the [`RawHandle::drop`] method.
///
/// The pointer is guaranteed to have been created using
/// [`triomphe::Arc::into_raw`].
///
/// We cannot use a [`triomphe::Arc<HandleData<T, D>>`] directly, because that
/// does not allow us to type-erase the `T` and `D`.
#[repr(transparent)]
pub struct RawHandle {
    /// Pointer to the inner handle data
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer must have been created from a
    ///    `triomphe::Arc<HandleData<T, D>>` for some `T` and `D` using
    ///    `triomphe::Arc::into_raw`.
    /// 2. The pointer retains full provenance over the `Arc` for the entire
    ///    lifetime of this object (i.e., it was not derived from a `&T`)
    /// 3. The pointer will point to the same `HandleData<T, D>` for the entire
    ///    lifetime of this object.
    ptr: NonNull<HandleHeader>,
}

impl RawHandle {
    /// Creates a new [`RawHandle`] from a
    /// [`triomphe::Arc<HandleData<T, D>>`].
    #[inline]
    pub(super) fn from_arc<T: 'static, D: Deleter<T>>(
        data: triomphe::Arc<HandleData<T, D>>,
    ) -> Self {
        let ptr: *const HandleData<T, D> = triomphe::Arc::into_raw(data);
        let ptr: *mut HandleHeader = ptr.cast::<HandleHeader>().cast_mut();

        // SAFETY:
        // 1. Triomphe guarantees that `Arc::into_raw` returns a non-null pointer.
        let ptr: NonNull<HandleHeader> = unsafe { NonNull::new_unchecked(ptr) };

        Self {
            // SAFETY:
            // 1. We just created the pointer using `triomphe::Arc::into_raw`.
            // 2. We have provenance and we are not locally changing that here
            // 3. We are creating the object here and we are not changing the pointer.
            ptr,
        }
    }

    /// Consumes the [`RawHandle`] without decrementing the reference count
    /// and returns the inner pointer.
    #[inline]
    pub(super) fn into_non_null(self) -> NonNull<HandleHeader> {
        let ptr = self.ptr;
        core::mem::forget(self);
        ptr
    }

    /// Creates a new [`RawHandle`] tracking `pointee`, paired with the
    /// specified deleter.
    ///
    /// The created handle will have a strong count of 1. If `armed` is true,
    /// the deleter runs when the last reference is dropped, unless the handle
    /// was released in the meantime. If `armed` is false the deleter never
    /// runs and is simply dropped along with the handle.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `pointee` points to a live, properly aligned `T` for as long as any
    ///    reference to this handle may access it.
    /// 2. If `armed` is true, ownership of the object is transferred to the
    ///    handle: `deleter` is entitled to destroy it, and nobody else destroys
    ///    it unless the handle hands ownership back through
    ///    [`RawHandle::try_into_parts`] first.
    #[inline]
    pub unsafe fn new<T, D>(pointee: NonNull<T>, deleter: D, armed: bool) -> Self
    where
        T: 'static,
        D: Deleter<T>,
    {
        let data = triomphe::Arc::new(HandleData::new(pointee, deleter, armed));
        Self::from_arc(data)
    }

    /// Returns a reference to the [`HandleData`] instance.
    #[inline]
    pub fn as_ref(&self) -> RawHandleRef<'_> {
        RawHandleRef {
            // SAFETY:
            // 1. Guaranteed by the invariants on `RawHandle`
            // 2. We are creating the `RawHandleRef` here, and we are
            //    not changing the pointer
            ptr: self.ptr,
            _marker: core::marker::PhantomData,
        }
    }
}

impl core::ops::Drop for RawHandle {
    #[inline]
    fn drop(&mut self) {
        let vtable = self.as_ref().vtable();

        // SAFETY:
        // 1. The pointer comes from `Arc::into_raw` (guaranteed by `RawHandle::new`)
        // 2. The vtable returned by `self.as_ref().vtable()` is guaranteed to match the
        //    data in the `HandleData`.
        // 3. The pointer is not used after this call (we're in the drop function)
        unsafe {
            vtable.drop(self.ptr);
        }
    }
}

/// A lifetime-bound pointer to a [`HandleData`] that is guaranteed to point
/// to an initialized instance of a [`HandleData<T, D>`] for some specific `T`
/// and `D`, though we do not know which.
///
/// We cannot use a [`&'a HandleData<T, D>`] directly, because that would
/// require us to know the actual types, which we do not.
///
/// [`&'a HandleData<T, D>`]: HandleData
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct RawHandleRef<'a> {
    /// Pointer to the inner handle data
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer must have been created from a
    ///    `triomphe::Arc<HandleData<T, D>>` for some `T` and `D` using
    ///    `triomphe::Arc::into_raw`.
    /// 2. The pointer will point to the same `HandleData<T, D>` for the entire
    ///    lifetime of this object.
    ptr: NonNull<HandleHeader>,

    /// Marker to tell the compiler that we should
    /// behave the same as a `&'a HandleHeader`
    _marker: core::marker::PhantomData<&'a HandleHeader>,
}

impl<'a> RawHandleRef<'a> {
    /// Returns a pointer to the [`HandleHeader`] of the [`HandleData`]
    /// instance.
    #[inline]
    pub(super) fn as_ptr(self) -> *const HandleHeader {
        self.ptr.as_ptr()
    }

    /// Returns the [`TypeId`] of the tracked object.
    #[inline]
    pub fn pointee_type_id(self) -> TypeId {
        self.vtable().type_id()
    }

    /// Returns the [`TypeId`] of the deleter paired with the tracked object.
    #[inline]
    pub fn deleter_type_id(self) -> TypeId {
        self.vtable().deleter_type_id()
    }

    /// Returns the [`core::any::type_name`] of the deleter paired with the
    /// tracked object.
    #[inline]
    pub fn deleter_type_name(self) -> &'static str {
        self.vtable().deleter_type_name()
    }

    /// Clones the inner [`triomphe::Arc`] and returns a new [`RawHandle`]
    /// pointing to the same data.
    ///
    #[inline]
    pub fn clone_arc(self) -> RawHandle {
        let vtable = self.vtable();
        // SAFETY:
        // 1. Guaranteed by invariants on this type
        // 2. The vtable returned by `self.vtable()` is guaranteed to match the data in
        //    the `HandleData`.
        unsafe { vtable.clone_arc(self.ptr) }
    }

    /// Returns true if both references point to the same [`HandleData`].
    #[inline]
    pub fn ptr_eq(self, other: RawHandleRef<'_>) -> bool {
        core::ptr::eq(self.as_ptr(), other.as_ptr())
    }

    /// Gets the strong_count of the inner [`triomphe::Arc`].
    #[inline]
    pub fn strong_count(self) -> usize {
        let vtable = self.vtable();
        // SAFETY:
        // 1. Guaranteed by invariants on this type
        // 2. The vtable returned by `self.vtable()` is guaranteed to match the data in
        //    the `HandleData`.
        unsafe { vtable.strong_count(self.ptr) }
    }
}
