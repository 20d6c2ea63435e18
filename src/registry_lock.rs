//! Process-wide lock used by the type registry.
//!
//! Uses `std::sync::RwLock` when the `std` feature is enabled and a spinning
//! `spin::RwLock` otherwise. The value starts out as `None` and is initialized
//! lazily by the first writer.

#[cfg(feature = "std")]
use std::sync as impl_;

#[cfg(not(feature = "std"))]
use spin as impl_;

#[repr(transparent)]
pub(crate) struct RegistryLock<T: 'static + Send + Sync>(impl_::RwLock<Option<T>>);

#[repr(transparent)]
pub(crate) struct RegistryReadGuard<T: 'static + Send + Sync>(
    impl_::RwLockReadGuard<'static, Option<T>>,
);

#[repr(transparent)]
pub(crate) struct RegistryWriteGuard<T: 'static + Send + Sync>(
    impl_::RwLockWriteGuard<'static, Option<T>>,
);

impl<T: 'static + Send + Sync> RegistryLock<T> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self(impl_::RwLock::new(None))
    }

    #[inline]
    pub(crate) fn read(&'static self) -> RegistryReadGuard<T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.read();

        // Writers only ever insert complete entries, so a poisoned lock still
        // guards a consistent map.
        #[cfg(feature = "std")]
        let guard = self.0.read().unwrap_or_else(impl_::PoisonError::into_inner);

        RegistryReadGuard(guard)
    }

    #[inline]
    pub(crate) fn write(&'static self) -> RegistryWriteGuard<T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.write();

        #[cfg(feature = "std")]
        let guard = self
            .0
            .write()
            .unwrap_or_else(impl_::PoisonError::into_inner);

        RegistryWriteGuard(guard)
    }
}

impl<T: 'static + Send + Sync> RegistryReadGuard<T> {
    #[inline]
    pub(crate) fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<T: 'static + Send + Sync> RegistryWriteGuard<T> {
    #[inline]
    pub(crate) fn get(&mut self) -> &mut Option<T> {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static LOCK: RegistryLock<u32> = RegistryLock::new();

    #[test]
    fn test_lazy_initialization() {
        assert!(LOCK.read().get().is_none_or(|value| *value >= 1));

        *LOCK.write().get().get_or_insert(0) += 1;

        assert!(LOCK.read().get().is_some_and(|value| *value >= 1));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_poisoned_lock_stays_usable() {
        static POISONED: RegistryLock<u32> = RegistryLock::new();

        *POISONED.write().get() = Some(7);

        let result = std::thread::spawn(|| {
            let _guard = POISONED.write();
            panic!("poison the registry lock");
        })
        .join();
        assert!(result.is_err());
        assert!(POISONED.0.is_poisoned());

        assert_eq!(POISONED.read().get(), Some(&7));
        *POISONED.write().get() = Some(8);
        assert_eq!(POISONED.read().get(), Some(&8));
    }
}
