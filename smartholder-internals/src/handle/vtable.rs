//! Vtable for type-erased handle operations.
//!
//! This module contains the [`HandleVtable`] which enables reference counting
//! operations on handles when their concrete pointee type `T` and deleter type
//! `D` have been erased. The vtable stores function pointers that dispatch to
//! the correct typed implementations.
//!
//! This module encapsulates the fields of [`HandleVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameters must match the actual pointee and
//! deleter types stored in the `HandleData`**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`HandleVtable::new`], which pairs the function pointers
//! with specific types `T` and `D` at compile time.

use core::{any::TypeId, ptr::NonNull};

use crate::{
    deleter::Deleter,
    handle::{
        data::{HandleData, HandleHeader},
        raw::RawHandle,
    },
};

/// Vtable for type-erased handle operations.
///
/// Contains function pointers for performing operations on handles without
/// knowing their concrete types at compile time.
///
/// # Safety
///
/// The following safety invariants are guaranteed to be upheld as long as this
/// struct exists:
///
/// * The fields `drop`, `clone_arc` and `strong_count` all point to the
///   functions defined below
/// * The concrete pointers are all instantiated with the same pointee type `T`
///   and deleter type `D` that were used to create this `HandleVtable`.
pub(crate) struct HandleVtable {
    /// Gets the [`TypeId`] of the pointee type that was used to create this
    /// [`HandleVtable`].
    type_id: fn() -> TypeId,
    /// Gets the [`TypeId`] of the deleter that was used to create this
    /// [`HandleVtable`].
    deleter_type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the deleter type.
    deleter_type_name: fn() -> &'static str,
    /// Method to drop the [`triomphe::Arc<HandleData<T, D>>`] instance pointed
    /// to by this pointer.
    drop: unsafe fn(NonNull<HandleHeader>),
    /// Clones the `triomphe::Arc<HandleData<T, D>>` pointed to by this
    /// pointer.
    clone_arc: unsafe fn(NonNull<HandleHeader>) -> RawHandle,
    /// Gets the strong count of the [`triomphe::Arc<HandleData<T, D>>`]
    /// pointed to by this pointer.
    strong_count: unsafe fn(NonNull<HandleHeader>) -> usize,
}

impl HandleVtable {
    /// Creates a new [`HandleVtable`] for the pointee type `T` and the deleter
    /// type `D`.
    pub(super) const fn new<T: 'static, D: Deleter<T>>() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<T>,
                deleter_type_id: TypeId::of::<D>,
                deleter_type_name: core::any::type_name::<D>,
                drop: drop::<T, D>,
                clone_arc: clone_arc::<T, D>,
                strong_count: strong_count::<T, D>,
            }
        }
    }

    /// Gets the [`TypeId`] of the pointee type that was used to create this
    /// [`HandleVtable`].
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`TypeId`] of the deleter type that was used to create this
    /// [`HandleVtable`].
    #[inline]
    pub(super) fn deleter_type_id(&self) -> TypeId {
        (self.deleter_type_id)()
    }

    /// Gets the [`core::any::type_name`] of the deleter type.
    #[inline]
    pub(super) fn deleter_type_name(&self) -> &'static str {
        (self.deleter_type_name)()
    }

    /// Drops the `triomphe::Arc<HandleData<T, D>>` instance pointed to by this
    /// pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer comes from a [`triomphe::Arc<HandleData<T, D>>`] turned
    ///    into a pointer via [`triomphe::Arc::into_raw`]
    /// 2. This [`HandleVtable`] must be a vtable for the pointee and deleter
    ///    types stored in the [`HandleData`].
    /// 3. The pointer is not used after calling this method. Storing the
    ///    pointer in structures that claim ownership of it, such as another
    ///    `Arc` counts as using after calling this method.
    #[inline]
    pub(super) unsafe fn drop(&self, ptr: NonNull<HandleHeader>) {
        // SAFETY: We know that `self.drop` points to the function `drop::<T, D>`
        // below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.drop)(ptr);
        }
    }

    /// Clones the [`triomphe::Arc<HandleData<T, D>>`] pointed to by this
    /// pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer comes from a [`triomphe::Arc<HandleData<T, D>>`] turned
    ///    into a pointer via [`triomphe::Arc::into_raw`]
    /// 2. This [`HandleVtable`] must be a vtable for the pointee and deleter
    ///    types stored in the [`HandleData`].
    #[inline]
    pub(super) unsafe fn clone_arc(&self, ptr: NonNull<HandleHeader>) -> RawHandle {
        // SAFETY: We know that `self.clone_arc` points to the function
        // `clone_arc::<T, D>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.clone_arc)(ptr) }
    }

    /// Gets the strong count of the [`triomphe::Arc<HandleData<T, D>>`]
    /// pointed to by this pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer comes from [`triomphe::Arc<HandleData<T, D>>`] via
    ///    [`triomphe::Arc::into_raw`]
    /// 2. This [`HandleVtable`] must be a vtable for the pointee and deleter
    ///    types stored in the [`HandleData`].
    #[inline]
    pub(super) unsafe fn strong_count(&self, ptr: NonNull<HandleHeader>) -> usize {
        // SAFETY: We know that `self.strong_count` points to the function
        // `strong_count::<T, D>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.strong_count)(ptr) }
    }
}

/// Drops the [`triomphe::Arc<HandleData<T, D>>`] instance pointed to by this
/// pointer.
///
/// When this was the last reference, dropping the [`HandleData`] runs the
/// guarded deleter.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer comes from [`triomphe::Arc<HandleData<T, D>>`] via
///    [`triomphe::Arc::into_raw`]
/// 2. The types `T` and `D` match the actual types stored in the
///    [`HandleData`]
/// 3. The pointer is not used after calling this method. Storing the pointer
///    in structures that claim ownership of it, such as another `Arc` counts
///    as using after calling this method.
unsafe fn drop<T: 'static, D: Deleter<T>>(ptr: NonNull<HandleHeader>) {
    let ptr: *const HandleData<T, D> = ptr.cast::<HandleData<T, D>>().as_ptr();
    // SAFETY:
    // 1. The pointer has the correct type and came from `Arc::into_raw` (guaranteed
    //    by caller)
    // 2. After `from_raw`, the pointer is consumed and not accessed again
    let arc = unsafe { triomphe::Arc::from_raw(ptr) };
    core::mem::drop(arc);
}

/// Clones the [`triomphe::Arc<HandleData<T, D>>`] pointed to by this pointer.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer comes from a [`triomphe::Arc<HandleData<T, D>>`] turned
///    into a pointer via [`triomphe::Arc::into_raw`]
/// 2. The types `T` and `D` match the actual types stored in the
///    [`HandleData`]
unsafe fn clone_arc<T: 'static, D: Deleter<T>>(ptr: NonNull<HandleHeader>) -> RawHandle {
    let ptr: *const HandleData<T, D> = ptr.cast::<HandleData<T, D>>().as_ptr();

    // SAFETY: The pointer is valid and came from `Arc::into_raw` with the correct
    // type (guaranteed by the caller), which fulfills the requirements for
    // `ArcBorrow::from_ptr`.
    let arc_borrow = unsafe { triomphe::ArcBorrow::from_ptr(ptr) };

    let arc = arc_borrow.clone_arc();
    RawHandle::from_arc(arc)
}

/// Gets the strong count of the [`triomphe::Arc<HandleData<T, D>>`] pointed
/// to by this pointer.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer comes from [`triomphe::Arc<HandleData<T, D>>`] via
///    [`triomphe::Arc::into_raw`]
/// 2. The types `T` and `D` match the actual types stored in the
///    [`HandleData`]
unsafe fn strong_count<T: 'static, D: Deleter<T>>(ptr: NonNull<HandleHeader>) -> usize {
    let ptr: *const HandleData<T, D> = ptr.cast::<HandleData<T, D>>().as_ptr();

    // SAFETY: The pointer is valid and came from `Arc::into_raw` with the correct
    // type (guaranteed by the caller), which fulfills the requirements for
    // `ArcBorrow::from_ptr`.
    let arc_borrow = unsafe { triomphe::ArcBorrow::from_ptr(ptr) };

    triomphe::ArcBorrow::strong_count(&arc_borrow)
}
