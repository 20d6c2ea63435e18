//! Canonical runtime type descriptors.
//!
//! A [`TypeDescriptor`] names the logical type of a tracked object or of a
//! destruction action. Descriptors are handed out by a process-wide registry:
//! each type is registered once, on first use, and the registry never
//! shrinks. Two descriptors are equal exactly when they refer to the same
//! registry entry.
//!
//! # Examples
//!
//! ```
//! use core::any::TypeId;
//!
//! use smartholder::TypeDescriptor;
//!
//! let a = TypeDescriptor::of::<String>();
//! let b = TypeDescriptor::of::<String>();
//! assert_eq!(a, b);
//! assert_ne!(a, TypeDescriptor::of::<u32>());
//!
//! assert_eq!(TypeDescriptor::lookup(TypeId::of::<String>()), Some(a));
//! assert!(a.name().ends_with("String"));
//! ```

use alloc::boxed::Box;
use core::{any::TypeId, fmt, hash::Hash};

use hashbrown::HashMap;

use crate::registry_lock::RegistryLock;

type Registry = HashMap<TypeId, &'static TypeEntry, rustc_hash::FxBuildHasher>;

static REGISTRY: RegistryLock<Registry> = RegistryLock::new();

/// A single entry of the type registry.
///
/// Entries are allocated once per type and live for the rest of the process.
#[derive(Debug)]
pub(crate) struct TypeEntry {
    type_id: TypeId,
    type_name: &'static str,
}

/// Canonical descriptor for a `'static` type.
///
/// The descriptor is a thin reference to a registry entry; copying it is
/// free, and comparing or hashing it uses the entry's address.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    entry: &'static TypeEntry,
}

impl TypeDescriptor {
    /// Returns the descriptor for `T`, registering it on first use.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let type_id = TypeId::of::<T>();
        if let Some(descriptor) = Self::lookup(type_id) {
            return descriptor;
        }

        let mut guard = REGISTRY.write();
        let entry: &'static TypeEntry = *guard
            .get()
            .get_or_insert_default()
            .entry(type_id)
            .or_insert_with(|| {
                tracing::trace!(type_name = core::any::type_name::<T>(), "registering type");
                Box::leak(Box::new(TypeEntry {
                    type_id,
                    type_name: core::any::type_name::<T>(),
                }))
            });

        Self { entry }
    }

    /// Returns the descriptor registered for `type_id`, if any.
    ///
    /// Unlike [`TypeDescriptor::of`] this never registers anything.
    pub fn lookup(type_id: TypeId) -> Option<Self> {
        let guard = REGISTRY.read();
        let entry: &'static TypeEntry = guard.get()?.get(&type_id)?;
        Some(Self { entry })
    }

    /// Returns the number of types registered so far.
    pub fn registered_types() -> usize {
        REGISTRY.read().get().map_or(0, HashMap::len)
    }

    /// The [`TypeId`] of the described type.
    #[must_use]
    pub fn type_id(self) -> TypeId {
        self.entry.type_id
    }

    /// The [`core::any::type_name`] of the described type.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.entry.type_name
    }

    /// Returns true if this descriptor describes `T`.
    #[must_use]
    pub fn is<T: ?Sized + 'static>(self) -> bool {
        self.entry.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.entry, other.entry)
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        core::ptr::hash(self.entry, state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor")
            .field(&self.entry.type_name)
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry.type_name)
    }
}
