use alloc::boxed::Box;
use core::{fmt, marker::PhantomData, mem::ManuallyDrop, ops, ptr::NonNull};

use crate::deleters::{DefaultDelete, Deleter};

/// An exclusively owned object paired with the action that destroys it.
///
/// `Unique<T, D>` is to a custom deleter what [`Box<T>`] is to the global
/// allocator: it owns the object pointed to, and when it is dropped it hands
/// the pointer to its deleter exactly once. Ownership can be moved into a
/// [`SmartHolder`](crate::SmartHolder) with
/// [`acquire_owned_custom`](crate::SmartHolder::acquire_owned_custom) and
/// taken back out, deleter included, with
/// [`release_owned_custom`](crate::SmartHolder::release_owned_custom).
///
/// # Examples
///
/// ```
/// use smartholder::Unique;
///
/// let mut unique = Unique::from_box(Box::new(vec![1, 2, 3]));
/// unique.push(4);
/// assert_eq!(*unique, [1, 2, 3, 4]);
///
/// let boxed: Box<Vec<i32>> = unique.into_box();
/// assert_eq!(boxed.len(), 4);
/// ```
pub struct Unique<T: 'static, D: Deleter<T> = DefaultDelete> {
    /// The owned object
    ///
    /// # Safety
    ///
    /// The following invariants are upheld as long as this struct exists:
    ///
    /// 1. The pointer refers to a live `T` that nobody else accesses.
    /// 2. `deleter` is entitled to destroy it.
    ptr: NonNull<T>,
    /// The destruction action. Only taken in `Drop` or `into_raw_parts`.
    deleter: ManuallyDrop<D>,
    _owned: PhantomData<T>,
}

impl<T: 'static> Unique<T, DefaultDelete> {
    /// Takes ownership of a boxed object, paired with [`DefaultDelete`].
    #[must_use]
    pub fn from_box(value: Box<T>) -> Self {
        let ptr = NonNull::from(Box::leak(value));

        // SAFETY:
        // 1. The pointer came from a leaked box that nobody else can access.
        // 2. `DefaultDelete` frees exactly such pointers.
        unsafe { Self::from_raw_parts(ptr, DefaultDelete) }
    }

    /// Converts back into the [`Box`] the object lives in.
    #[must_use]
    pub fn into_box(self) -> Box<T> {
        let (ptr, DefaultDelete) = self.into_raw_parts();

        // SAFETY: Pointers paired with `DefaultDelete` always come from
        // `Box::into_raw`, and we own it.
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }
}

impl<T: 'static, D: Deleter<T>> Unique<T, D> {
    /// Pairs a pointer with its destruction action.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live, properly aligned `T` that nobody else
    ///    accesses or destroys for as long as the returned value (or whatever
    ///    it is moved into) owns it.
    /// 2. Calling `deleter.delete(ptr)` is a valid way to destroy the object.
    #[must_use]
    pub unsafe fn from_raw_parts(ptr: NonNull<T>, deleter: D) -> Self {
        Self {
            ptr,
            deleter: ManuallyDrop::new(deleter),
            _owned: PhantomData,
        }
    }

    /// Gives up ownership, returning the pointer together with its deleter.
    ///
    /// The caller becomes responsible for destroying the object.
    #[must_use]
    pub fn into_raw_parts(self) -> (NonNull<T>, D) {
        let mut this = ManuallyDrop::new(self);
        let ptr = this.ptr;

        // SAFETY: `this` is never dropped or used again, so the deleter is
        // moved out exactly once.
        let deleter = unsafe { ManuallyDrop::take(&mut this.deleter) };

        (ptr, deleter)
    }

    /// Returns the address of the owned object.
    #[must_use]
    pub fn as_ptr(&self) -> NonNull<T> {
        self.ptr
    }

    /// Returns a reference to the destruction action.
    #[must_use]
    pub fn deleter(&self) -> &D {
        &self.deleter
    }
}

impl<T: 'static, D: Deleter<T>> Drop for Unique<T, D> {
    fn drop(&mut self) {
        // SAFETY: We are being dropped, so the deleter is never used again.
        let deleter = unsafe { ManuallyDrop::take(&mut self.deleter) };

        // SAFETY: The invariants of this type guarantee that `deleter` may
        // destroy the object, and nobody accesses it afterwards.
        unsafe { deleter.delete(self.ptr) }
    }
}

impl<T: 'static, D: Deleter<T>> ops::Deref for Unique<T, D> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: The pointee is alive and exclusively ours.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: 'static, D: Deleter<T>> ops::DerefMut for Unique<T, D> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: The pointee is alive and exclusively ours, and `&mut self`
        // guarantees there are no other borrows through this value.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T: 'static> From<Box<T>> for Unique<T, DefaultDelete> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T: 'static + fmt::Debug, D: Deleter<T>> fmt::Debug for Unique<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unique")
            .field("value", &**self)
            .field("deleter", &core::any::type_name::<D>())
            .finish()
    }
}

// SAFETY: `Unique` owns its object and deleter the way `Box` owns its
// contents, so it can be sent when both of them can.
unsafe impl<T: 'static + Send, D: Deleter<T> + Send> Send for Unique<T, D> {}

// SAFETY: Shared access to a `Unique` only hands out shared references to the
// object and the deleter.
unsafe impl<T: 'static + Sync, D: Deleter<T> + Sync> Sync for Unique<T, D> {}
