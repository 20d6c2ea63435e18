use alloc::boxed::Box;
use core::{fmt, marker::PhantomData, ptr::NonNull};

use smartholder_internals::{RawHandle, RawHandleRef};

use crate::{
    DefaultDelete, HolderError, HolderErrorKind, NoDelete, Operation, Shared, TypeDescriptor,
    Unique,
    deleters::Deleter,
    markers::{self, SendSync, ThreadSafetyMarker},
};

/// A type-erased slot that tracks one object under a changing ownership
/// regime.
///
/// A holder can be populated in four ways:
///
/// - [`acquire_unowned`](Self::acquire_unowned): reference an object owned
///   elsewhere; the holder never destroys it.
/// - [`acquire_owned`](Self::acquire_owned): take exclusive ownership of a
///   [`Box`]; the object is destroyed with [`DefaultDelete`].
/// - [`acquire_owned_custom`](Self::acquire_owned_custom): take exclusive
///   ownership of a [`Unique`] together with its deleter.
/// - [`acquire_shared`](Self::acquire_shared): join the owners of a
///   [`Shared`] object.
///
/// Whatever the path, the holder remembers the object's type as a
/// [`TypeDescriptor`], and every typed accessor checks the requested type
/// against it before handing anything out. Exclusive ownership can be handed
/// back with [`release_owned`](Self::release_owned) or
/// [`release_owned_custom`](Self::release_owned_custom), which disarms the
/// destruction action shared by every handle to the object. The object is
/// therefore destroyed exactly once, by whoever owns it at the time.
///
/// # Examples
///
/// ```
/// use smartholder::{HolderErrorKind, SmartHolder};
///
/// let mut holder: SmartHolder = SmartHolder::new();
/// holder.acquire_owned(Box::new(String::from("widget")));
///
/// let shared = holder.as_shared::<String>().unwrap();
/// assert_eq!(holder.share_count(), 2);
///
/// let error = holder.release_owned::<String>().unwrap_err();
/// assert_eq!(error.kind(), HolderErrorKind::NonExclusive { share_count: 2 });
///
/// drop(shared);
/// let widget: Box<String> = holder.release_owned().unwrap();
/// assert_eq!(*widget, "widget");
/// assert!(!holder.is_populated());
/// ```
pub struct SmartHolder<ThreadSafety: 'static = SendSync> {
    /// The type recorded by the most recent acquisition
    held_type: Option<TypeDescriptor>,
    /// The custom deleter recorded by the most recent acquisition, if it went
    /// through the custom path
    deleter_type: Option<TypeDescriptor>,
    /// The holder's reference to the tracked object.
    ///
    /// # Safety
    ///
    /// The following invariants are upheld as long as this struct exists:
    ///
    /// 1. If present, the pointee type of the handle is described by
    ///    `held_type`.
    /// 2. If present, the deleter type of the handle is [`DefaultDelete`] when
    ///    `uses_default_destruction` is set, and the type described by
    ///    `deleter_type` when that is set.
    /// 3. The pointee stays alive for as long as the handle exists.
    /// 4. If `ThreadSafety = SendSync`, then the pointee and the deleter of
    ///    the handle are `Send + Sync`.
    handle: Option<RawHandle>,
    /// Whether the most recent acquisition went through the default
    /// destruction path
    uses_default_destruction: bool,
    _thread_safety: PhantomData<ThreadSafety>,
}

impl<TS> SmartHolder<TS> {
    /// Creates an empty holder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            held_type: None,
            deleter_type: None,
            handle: None,
            uses_default_destruction: false,
            _thread_safety: PhantomData,
        }
    }

    /// Resets the holder to its empty state, dropping its reference to the
    /// tracked object.
    ///
    /// If the holder was the last owner of the object, and destruction is
    /// still live, the object is destroyed.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Returns true if the holder currently references an object.
    ///
    /// This is false for a new holder, after [`clear`](Self::clear) and after
    /// ownership was released.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.handle.is_some()
    }

    /// The type recorded by the most recent acquisition.
    ///
    /// This is kept after ownership has been released, and only reset by
    /// [`clear`](Self::clear).
    #[must_use]
    pub fn held_type(&self) -> Option<TypeDescriptor> {
        self.held_type
    }

    /// The deleter recorded by the most recent
    /// [`acquire_owned_custom`](Self::acquire_owned_custom), if that was the
    /// most recent acquisition.
    #[must_use]
    pub fn deleter_type(&self) -> Option<TypeDescriptor> {
        self.deleter_type
    }

    /// Returns true if the most recent acquisition went through
    /// [`acquire_owned`](Self::acquire_owned) or
    /// [`acquire_owned_raw`](Self::acquire_owned_raw).
    #[must_use]
    pub fn uses_default_destruction(&self) -> bool {
        self.uses_default_destruction
    }

    /// Returns the number of handles sharing the tracked object, including
    /// the holder's own. Zero if the holder is empty.
    #[must_use]
    pub fn share_count(&self) -> usize {
        self.raw_ref().map_or(0, RawHandleRef::strong_count)
    }

    /// Returns true while the last handle to the tracked object will still
    /// destroy it.
    ///
    /// This is false for an empty holder and for objects acquired through
    /// [`acquire_unowned`](Self::acquire_unowned).
    #[must_use]
    pub fn is_destruction_live(&self) -> bool {
        self.raw_ref().is_some_and(RawHandleRef::is_armed)
    }

    /// References an object owned elsewhere.
    ///
    /// The holder and any [`Shared`] handle derived from it never destroy the
    /// object. Because the holder did not acquire ownership, neither
    /// [`release_owned`](Self::release_owned) nor
    /// [`release_owned_custom`](Self::release_owned_custom) will succeed.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live, properly aligned `T`.
    /// 2. The object outlives the holder and every [`Shared`] handle derived
    ///    from it, and is not mutated while any of them can reach it.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::ptr::NonNull;
    ///
    /// use smartholder::SmartHolder;
    ///
    /// let value = 42u32;
    /// let mut holder: SmartHolder = SmartHolder::new();
    ///
    /// // SAFETY: `value` outlives `holder`
    /// unsafe { holder.acquire_unowned(NonNull::from(&value)) };
    ///
    /// assert_eq!(*holder.borrow::<u32>().unwrap(), 42);
    /// assert!(!holder.is_destruction_live());
    /// assert!(holder.release_owned::<u32>().is_err());
    /// ```
    pub unsafe fn acquire_unowned<T>(&mut self, ptr: NonNull<T>)
    where
        T: markers::ObjectMarkerFor<TS>,
    {
        // SAFETY: The handle is created disarmed, so `NoDelete` is never even
        // asked to run, and the caller guarantees the pointee stays alive for
        // as long as the handle can reach it.
        let handle = unsafe { RawHandle::new(ptr, NoDelete, false) };

        // SAFETY:
        // 1. The handle was created with pointee type `T`.
        // 2. Neither the default nor a custom path is recorded.
        // 3. Guaranteed by the caller.
        // 4. Guaranteed by the `ObjectMarkerFor<TS>` bound on `T`, and `NoDelete`
        //    is `Send + Sync`.
        unsafe {
            self.install::<T>(Operation::AcquireUnowned, handle, None, false);
        }
    }

    /// Takes exclusive ownership of a boxed object.
    ///
    /// The object will be destroyed with [`DefaultDelete`], unless ownership is
    /// handed back with [`release_owned`](Self::release_owned) first.
    pub fn acquire_owned<T>(&mut self, value: Box<T>)
    where
        T: markers::ObjectMarkerFor<TS>,
    {
        let ptr = NonNull::from(Box::leak(value));

        // SAFETY: The pointer came from a leaked box that nobody else can
        // access.
        unsafe { self.acquire_boxed(Operation::AcquireOwned, ptr) }
    }

    /// Takes exclusive ownership of an object allocated with [`Box`] and
    /// turned into a raw pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` came from [`Box::into_raw`] or [`Box::leak`] for a `Box<T>`.
    /// 2. Nobody else accesses or frees the object afterwards.
    pub unsafe fn acquire_owned_raw<T>(&mut self, ptr: NonNull<T>)
    where
        T: markers::ObjectMarkerFor<TS>,
    {
        // SAFETY: Guaranteed by the caller.
        unsafe { self.acquire_boxed(Operation::AcquireOwnedRaw, ptr) }
    }

    /// # Safety
    ///
    /// The same requirements as for
    /// [`acquire_owned_raw`](Self::acquire_owned_raw) apply.
    unsafe fn acquire_boxed<T>(&mut self, operation: Operation, ptr: NonNull<T>)
    where
        T: markers::ObjectMarkerFor<TS>,
    {
        // SAFETY: Ownership of a boxed object is transferred to the handle,
        // guaranteed by the caller, and `DefaultDelete` frees boxed objects.
        let handle = unsafe { RawHandle::new(ptr, DefaultDelete, true) };

        // SAFETY:
        // 1. The handle was created with pointee type `T`.
        // 2. The handle was created with `DefaultDelete` and the default path is
        //    recorded.
        // 3. The handle is armed and owns the pointee exclusively.
        // 4. Guaranteed by the `ObjectMarkerFor<TS>` bound on `T`, and
        //    `DefaultDelete` is `Send + Sync`.
        unsafe {
            self.install::<T>(operation, handle, None, true);
        }
    }

    /// Takes exclusive ownership of an object together with the action that
    /// destroys it.
    ///
    /// ```
    /// use smartholder::{NoDelete, SmartHolder, Unique};
    ///
    /// let mut holder: SmartHolder = SmartHolder::new();
    /// holder.acquire_owned_custom(Unique::from_box(Box::new(3.5f64)));
    /// assert_eq!(holder.deleter_type().map(|d| d.name()), Some("smartholder::deleters::DefaultDelete"));
    ///
    /// // The deleter type is part of the check
    /// assert!(holder.release_owned_custom::<f64, NoDelete>().is_err());
    ///
    /// let unique = holder.release_owned_custom::<f64, smartholder::DefaultDelete>().unwrap();
    /// assert_eq!(*unique, 3.5);
    /// ```
    pub fn acquire_owned_custom<T, D>(&mut self, value: Unique<T, D>)
    where
        T: markers::ObjectMarkerFor<TS>,
        D: Deleter<T> + markers::ObjectMarkerFor<TS>,
    {
        let (ptr, deleter) = value.into_raw_parts();

        // SAFETY: `Unique` guarantees the pointee is alive and that `deleter`
        // may destroy it, and ownership has just been released to us.
        let handle = unsafe { RawHandle::new(ptr, deleter, true) };

        // SAFETY:
        // 1. The handle was created with pointee type `T`.
        // 2. The handle was created with deleter type `D`, which is recorded.
        // 3. The handle is armed and owns the pointee exclusively.
        // 4. Guaranteed by the `ObjectMarkerFor<TS>` bounds on `T` and `D`.
        unsafe {
            self.install::<T>(
                Operation::AcquireOwnedCustom,
                handle,
                Some(TypeDescriptor::of::<D>()),
                false,
            );
        }
    }

    /// Joins the owners of a shared object.
    ///
    /// The holder keeps one of the object's handles. The object is destroyed
    /// when the last handle, including the holder's, goes away.
    pub fn acquire_shared<T: 'static>(&mut self, value: Shared<T, TS>) {
        let handle = value.into_raw();

        // SAFETY:
        // 1. `Shared<T, TS>` guarantees the pointee type is `T`.
        // 2. Neither the default nor a custom path is recorded.
        // 3. Guaranteed by the invariants of `Shared`.
        // 4. Guaranteed by the invariants of `Shared<T, TS>`.
        unsafe {
            self.install::<T>(Operation::AcquireShared, handle, None, false);
        }
    }

    /// Hands exclusive ownership back to the caller as a [`Box`].
    ///
    /// Succeeds only if the holder was populated through
    /// [`acquire_owned`](Self::acquire_owned) or
    /// [`acquire_owned_raw`](Self::acquire_owned_raw) with the same `T`, still
    /// holds the object, and no other handle shares it. Afterwards the
    /// holder is empty, and the destruction action is disarmed.
    pub fn release_owned<T: 'static>(&mut self) -> Result<Box<T>, HolderError> {
        let ptr = self.release_default::<T>(Operation::ReleaseOwned)?;

        // SAFETY: Objects on the default path always come from a `Box<T>`, and
        // the handle has just handed ownership back to us.
        Ok(unsafe { Box::from_raw(ptr.as_ptr()) })
    }

    /// Hands exclusive ownership back to the caller as a pointer obtained
    /// from [`Box::into_raw`].
    ///
    /// The same preconditions as for [`release_owned`](Self::release_owned)
    /// apply. The caller becomes responsible for freeing the object, for
    /// instance with [`Box::from_raw`].
    pub fn release_owned_raw<T: 'static>(&mut self) -> Result<NonNull<T>, HolderError> {
        self.release_default::<T>(Operation::ReleaseOwnedRaw)
    }

    /// Hands exclusive ownership back to the caller together with the deleter
    /// it was acquired with.
    ///
    /// Succeeds only if the holder was populated through
    /// [`acquire_owned_custom`](Self::acquire_owned_custom) with the same `T`
    /// and `D`, still holds the object, and no other handle shares it.
    pub fn release_owned_custom<T, D>(&mut self) -> Result<Unique<T, D>, HolderError>
    where
        T: 'static,
        D: Deleter<T>,
    {
        let operation = Operation::ReleaseOwnedCustom;
        self.check_type::<T>(operation)?;

        let requested = TypeDescriptor::of::<D>();
        if self.deleter_type != Some(requested) {
            return Err(self.fail(
                operation,
                HolderErrorKind::DeleterMismatch {
                    requested,
                    held: self.deleter_type,
                },
            ));
        }

        let (ptr, deleter) = self.take_exclusive::<T, D>(operation)?;

        // SAFETY: The handle has just handed ownership back to us together
        // with the deleter it was acquired with.
        Ok(unsafe { Unique::from_raw_parts(ptr, deleter) })
    }

    /// Returns a new shared handle to the tracked object.
    ///
    /// The share count grows by one. While the returned handle exists,
    /// exclusive ownership cannot be released.
    pub fn as_shared<T: 'static>(&self) -> Result<Shared<T, TS>, HolderError> {
        let operation = Operation::AsShared;
        self.check_type::<T>(operation)?;
        let handle = self.populated_ref(operation)?;

        let raw = handle.clone_arc();
        tracing::trace!(
            %operation,
            held = core::any::type_name::<T>(),
            share_count = raw.as_ref().strong_count(),
            "shared object"
        );

        // SAFETY:
        // 1. The pointee type is `T`, as checked against `held_type` above.
        // 2. Guaranteed by the invariants of `self.handle`.
        // 3. Guaranteed by the invariants of `self.handle`.
        Ok(unsafe { Shared::from_raw(raw) })
    }

    /// Borrows the tracked object.
    pub fn borrow<T: 'static>(&self) -> Result<&T, HolderError> {
        let operation = Operation::Borrow;
        self.check_type::<T>(operation)?;
        let handle = self.populated_ref(operation)?;

        // SAFETY:
        // 1. The pointee type is `T`, as checked against `held_type` above.
        // 2. The pointee is alive for as long as `self.handle`, which is borrowed
        //    for the returned lifetime.
        Ok(unsafe { handle.pointee_downcast_unchecked::<T>() })
    }

    /// Returns the address of the tracked object, or `None` if the holder
    /// does not reference one.
    ///
    /// The type is still checked if the holder was populated before.
    pub fn borrow_raw<T: 'static>(&self) -> Result<Option<NonNull<T>>, HolderError> {
        if self.held_type.is_some() {
            self.check_type::<T>(Operation::BorrowRaw)?;
        }

        Ok(self
            .raw_ref()
            .map(|handle| handle.pointee_ptr().cast::<T>()))
    }

    fn raw_ref(&self) -> Option<RawHandleRef<'_>> {
        self.handle.as_ref().map(RawHandle::as_ref)
    }

    fn populated_ref(&self, operation: Operation) -> Result<RawHandleRef<'_>, HolderError> {
        self.raw_ref()
            .ok_or_else(|| self.fail(operation, HolderErrorKind::Empty))
    }

    /// Replaces the whole state of the holder.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the arguments uphold the invariants of the
    /// `handle` field, with `held_type` describing `T`.
    unsafe fn install<T: 'static>(
        &mut self,
        operation: Operation,
        handle: RawHandle,
        deleter_type: Option<TypeDescriptor>,
        uses_default_destruction: bool,
    ) {
        debug_assert_eq!(
            handle.as_ref().pointee_type_id(),
            core::any::TypeId::of::<T>()
        );

        tracing::trace!(
            %operation,
            held = core::any::type_name::<T>(),
            deleter = deleter_type.map(TypeDescriptor::name),
            share_count = handle.as_ref().strong_count(),
            live = handle.as_ref().is_armed(),
            "acquired object"
        );

        *self = Self {
            held_type: Some(TypeDescriptor::of::<T>()),
            deleter_type,
            handle: Some(handle),
            uses_default_destruction,
            _thread_safety: PhantomData,
        };
    }

    fn check_type<T: 'static>(&self, operation: Operation) -> Result<(), HolderError> {
        let Some(held) = self.held_type else {
            return Err(self.fail(operation, HolderErrorKind::Empty));
        };

        let requested = TypeDescriptor::of::<T>();
        if requested == held {
            Ok(())
        } else {
            Err(self.fail(
                operation,
                HolderErrorKind::TypeMismatch { requested, held },
            ))
        }
    }

    fn release_default<T: 'static>(
        &mut self,
        operation: Operation,
    ) -> Result<NonNull<T>, HolderError> {
        self.check_type::<T>(operation)?;

        if !self.uses_default_destruction {
            return Err(self.fail(
                operation,
                HolderErrorKind::DeleterMismatch {
                    requested: TypeDescriptor::of::<DefaultDelete>(),
                    held: self.deleter_type,
                },
            ));
        }

        let (ptr, DefaultDelete) = self.take_exclusive::<T, DefaultDelete>(operation)?;
        Ok(ptr)
    }

    /// Disarms the handle and takes the pointer and deleter out of it, if the
    /// holder has the only reference.
    ///
    /// The caller must have checked `T` against `held_type` and `D` against
    /// the recorded destruction path.
    fn take_exclusive<T: 'static, D: Deleter<T>>(
        &mut self,
        operation: Operation,
    ) -> Result<(NonNull<T>, D), HolderError> {
        let Some(handle) = self.handle.take() else {
            return Err(self.fail(operation, HolderErrorKind::Empty));
        };

        // SAFETY: The caller checked the pointee type against `held_type` and
        // the deleter type against the recorded destruction path, which by the
        // invariants of `self.handle` match the types in the handle.
        match unsafe { handle.try_into_parts::<T, D>() } {
            Ok(parts) => {
                tracing::trace!(
                    %operation,
                    held = core::any::type_name::<T>(),
                    "released ownership"
                );
                Ok(parts)
            }
            Err(handle) => {
                let share_count = handle.as_ref().strong_count();
                self.handle = Some(handle);
                Err(self.fail(
                    operation,
                    HolderErrorKind::NonExclusive { share_count },
                ))
            }
        }
    }

    #[cold]
    fn fail(&self, operation: Operation, kind: HolderErrorKind) -> HolderError {
        tracing::debug!(
            %operation,
            %kind,
            held = self.held_type.map(TypeDescriptor::name),
            share_count = self.share_count(),
            "holder operation failed"
        );
        HolderError::new(operation, kind)
    }
}

impl<TS> Default for SmartHolder<TS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, TS> From<Box<T>> for SmartHolder<TS>
where
    T: markers::ObjectMarkerFor<TS>,
{
    fn from(value: Box<T>) -> Self {
        let mut holder = Self::new();
        holder.acquire_owned(value);
        holder
    }
}

impl<T, D, TS> From<Unique<T, D>> for SmartHolder<TS>
where
    T: markers::ObjectMarkerFor<TS>,
    D: Deleter<T> + markers::ObjectMarkerFor<TS>,
{
    fn from(value: Unique<T, D>) -> Self {
        let mut holder = Self::new();
        holder.acquire_owned_custom(value);
        holder
    }
}

impl<T: 'static, TS> From<Shared<T, TS>> for SmartHolder<TS> {
    fn from(value: Shared<T, TS>) -> Self {
        let mut holder = Self::new();
        holder.acquire_shared(value);
        holder
    }
}

impl<TS: ThreadSafetyMarker> fmt::Debug for SmartHolder<TS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartHolder")
            .field("thread_safety", &TS::NAME)
            .field("held_type", &self.held_type.map(TypeDescriptor::name))
            .field("deleter_type", &self.deleter_type.map(TypeDescriptor::name))
            .field("populated", &self.is_populated())
            .field("uses_default_destruction", &self.uses_default_destruction)
            .field("destruction_live", &self.is_destruction_live())
            .field("share_count", &self.share_count())
            .finish()
    }
}

impl<TS> Unpin for SmartHolder<TS> {}

// SAFETY: The `SendSync` marker indicates that the tracked object and its
// deleter are `Send`+`Sync`. Therefore it is safe to implement `Send`+`Sync`
// for the holder itself.
unsafe impl Send for SmartHolder<SendSync> {}

// SAFETY: The `SendSync` marker indicates that the tracked object and its
// deleter are `Send`+`Sync`. Therefore it is safe to implement `Send`+`Sync`
// for the holder itself.
unsafe impl Sync for SmartHolder<SendSync> {}

#[cfg(test)]
mod tests {
    use alloc::{format, string::String, vec::Vec};

    use super::*;
    use crate::markers::Local;

    #[test]
    fn test_new_holder_is_empty() {
        let holder: SmartHolder = SmartHolder::default();

        assert!(!holder.is_populated());
        assert_eq!(holder.held_type(), None);
        assert_eq!(holder.share_count(), 0);
        assert!(!holder.is_destruction_live());

        let error = holder.borrow::<u8>().unwrap_err();
        assert_eq!(error.kind(), HolderErrorKind::Empty);
        assert_eq!(error.operation(), Operation::Borrow);

        assert_eq!(holder.borrow_raw::<u8>(), Ok(None));
    }

    #[test]
    fn test_acquire_replaces_state() {
        let mut holder: SmartHolder = SmartHolder::new();
        holder.acquire_owned_custom(Unique::from_box(Box::new(1u8)));
        assert!(holder.deleter_type().is_some());
        assert!(!holder.uses_default_destruction());

        holder.acquire_owned(Box::new(String::from("second")));
        assert_eq!(holder.held_type(), Some(TypeDescriptor::of::<String>()));
        assert_eq!(holder.deleter_type(), None);
        assert!(holder.uses_default_destruction());
        assert_eq!(holder.borrow::<String>().unwrap(), "second");
    }

    #[test]
    fn test_release_keeps_held_type() {
        let mut holder: SmartHolder = SmartHolder::from(Box::new(9u16));
        let value = holder.release_owned::<u16>().unwrap();
        assert_eq!(*value, 9);

        assert!(!holder.is_populated());
        assert_eq!(holder.held_type(), Some(TypeDescriptor::of::<u16>()));
        assert_eq!(
            holder.release_owned::<u16>().unwrap_err().kind(),
            HolderErrorKind::Empty
        );
        assert_eq!(holder.borrow_raw::<u16>(), Ok(None));
        assert!(matches!(
            holder.borrow_raw::<u32>().unwrap_err().kind(),
            HolderErrorKind::TypeMismatch { .. }
        ));

        holder.clear();
        assert_eq!(holder.held_type(), None);
    }

    #[test]
    fn test_release_check_order() {
        let mut holder: SmartHolder = SmartHolder::new();
        holder.acquire_owned_custom(Unique::from_box(Box::new(5i64)));
        let _shared = holder.as_shared::<i64>().unwrap();

        // Type is checked before the deleter, and the deleter before the count
        assert!(matches!(
            holder.release_owned::<i32>().unwrap_err().kind(),
            HolderErrorKind::TypeMismatch { .. }
        ));
        assert_eq!(
            holder.release_owned::<i64>().unwrap_err().kind(),
            HolderErrorKind::DeleterMismatch {
                requested: TypeDescriptor::of::<DefaultDelete>(),
                held: Some(TypeDescriptor::of::<DefaultDelete>()),
            }
        );
        assert_eq!(
            holder
                .release_owned_custom::<i64, DefaultDelete>()
                .unwrap_err()
                .kind(),
            HolderErrorKind::NonExclusive { share_count: 2 }
        );
        assert!(holder.is_populated());
        assert!(holder.is_destruction_live());
    }

    #[test]
    fn test_shared_path_cannot_release() {
        let shared: Shared<Vec<u8>> = Shared::new(alloc::vec![1]);
        let mut holder = SmartHolder::from(shared);

        assert_eq!(holder.share_count(), 1);
        assert!(!holder.uses_default_destruction());
        assert!(matches!(
            holder.release_owned::<Vec<u8>>().unwrap_err().kind(),
            HolderErrorKind::DeleterMismatch { held: None, .. }
        ));
        assert!(matches!(
            holder
                .release_owned_custom::<Vec<u8>, DefaultDelete>()
                .unwrap_err()
                .kind(),
            HolderErrorKind::DeleterMismatch { held: None, .. }
        ));
        assert_eq!(holder.borrow::<Vec<u8>>().unwrap(), &[1]);
    }

    #[test]
    fn test_release_owned_raw() {
        let mut holder: SmartHolder = SmartHolder::new();
        let ptr = NonNull::from(Box::leak(Box::new(String::from("raw"))));

        // SAFETY: The pointer came from a leaked box
        unsafe { holder.acquire_owned_raw(ptr) };
        assert_eq!(holder.borrow_raw::<String>(), Ok(Some(ptr)));

        let released = holder.release_owned_raw::<String>().unwrap();
        assert_eq!(released, ptr);

        // SAFETY: Ownership was handed back to us
        let value = unsafe { Box::from_raw(released.as_ptr()) };
        assert_eq!(*value, "raw");
    }

    #[test]
    fn test_local_holder() {
        use alloc::rc::Rc;

        let rc = Rc::new(3);
        let mut holder: SmartHolder<Local> = SmartHolder::new();
        holder.acquire_owned(Box::new(rc.clone()));
        assert_eq!(Rc::strong_count(&rc), 2);

        let shared = holder.as_shared::<Rc<i32>>().unwrap();
        assert_eq!(**shared, 3);
        core::mem::drop(shared);

        holder.clear();
        assert_eq!(Rc::strong_count(&rc), 1);
    }

    #[test]
    fn test_debug() {
        let mut holder: SmartHolder = SmartHolder::new();
        holder.acquire_owned(Box::new(1u32));

        let debug = format!("{holder:?}");
        assert!(debug.contains("thread_safety: \"SendSync\""));
        assert!(debug.contains("held_type: Some(\"u32\")"));
        assert!(debug.contains("share_count: 1"));
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_impl_all!(SmartHolder<SendSync>: Send, Sync, Default, Unpin);
        static_assertions::assert_not_impl_any!(SmartHolder<Local>: Send, Sync);
        static_assertions::assert_not_impl_any!(SmartHolder: Clone, Copy);
    }
}
