//! Errors reported by [`SmartHolder`](crate::SmartHolder) operations.
//!
//! Every failing operation returns a [`HolderError`], which names the
//! operation that failed and the precondition that did not hold. A failed
//! operation never modifies the holder.

use core::fmt;

use derive_more::{Display, Error};

use crate::TypeDescriptor;

/// Holder operations, as named in errors and log events.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, Hash)]
pub enum Operation {
    /// [`SmartHolder::acquire_unowned`](crate::SmartHolder::acquire_unowned)
    #[display("acquire_unowned")]
    AcquireUnowned,
    /// [`SmartHolder::acquire_owned`](crate::SmartHolder::acquire_owned)
    #[display("acquire_owned")]
    AcquireOwned,
    /// [`SmartHolder::acquire_owned_raw`](crate::SmartHolder::acquire_owned_raw)
    #[display("acquire_owned_raw")]
    AcquireOwnedRaw,
    /// [`SmartHolder::acquire_owned_custom`](crate::SmartHolder::acquire_owned_custom)
    #[display("acquire_owned_custom")]
    AcquireOwnedCustom,
    /// [`SmartHolder::acquire_shared`](crate::SmartHolder::acquire_shared)
    #[display("acquire_shared")]
    AcquireShared,
    /// [`SmartHolder::release_owned`](crate::SmartHolder::release_owned)
    #[display("release_owned")]
    ReleaseOwned,
    /// [`SmartHolder::release_owned_raw`](crate::SmartHolder::release_owned_raw)
    #[display("release_owned_raw")]
    ReleaseOwnedRaw,
    /// [`SmartHolder::release_owned_custom`](crate::SmartHolder::release_owned_custom)
    #[display("release_owned_custom")]
    ReleaseOwnedCustom,
    /// [`SmartHolder::as_shared`](crate::SmartHolder::as_shared)
    #[display("as_shared")]
    AsShared,
    /// [`SmartHolder::borrow`](crate::SmartHolder::borrow)
    #[display("borrow")]
    Borrow,
    /// [`SmartHolder::borrow_raw`](crate::SmartHolder::borrow_raw)
    #[display("borrow_raw")]
    BorrowRaw,
}

/// The precondition that a holder operation found violated.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum HolderErrorKind {
    /// The requested type is not the type the holder was populated with.
    #[display("requested type {requested}, but the holder tracks {held}")]
    TypeMismatch {
        /// The type passed to the operation
        requested: TypeDescriptor,
        /// The type recorded at acquisition
        held: TypeDescriptor,
    },
    /// The requested destruction action is not the one the object was
    /// acquired with.
    #[display("requested deleter {requested}, but {}", HeldDeleter(*held))]
    DeleterMismatch {
        /// The deleter passed to the operation
        requested: TypeDescriptor,
        /// The custom deleter recorded at acquisition, if any
        held: Option<TypeDescriptor>,
    },
    /// The holder does not hold an object, either because it was never
    /// populated or because ownership has been released.
    #[display("the holder is empty")]
    Empty,
    /// Exclusive ownership was requested while other shared handles exist.
    #[display("the object is shared by {share_count} handles")]
    NonExclusive {
        /// The number of handles referencing the object at the time of the
        /// call
        share_count: usize,
    },
}

struct HeldDeleter(Option<TypeDescriptor>);

impl fmt::Display for HeldDeleter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(deleter) => write!(
                f,
                "the object was acquired through the custom-deleter path with {deleter}"
            ),
            None => f.write_str("the holder tracks no custom deleter"),
        }
    }
}

/// Error returned by a failing [`SmartHolder`](crate::SmartHolder)
/// operation.
///
/// ```
/// use smartholder::{HolderErrorKind, Operation, SmartHolder};
///
/// let mut holder: SmartHolder = SmartHolder::new();
/// holder.acquire_owned(Box::new(1u8));
///
/// let error = holder.release_owned::<u16>().unwrap_err();
/// assert_eq!(error.operation(), Operation::ReleaseOwned);
/// assert!(matches!(error.kind(), HolderErrorKind::TypeMismatch { .. }));
/// assert_eq!(
///     error.to_string(),
///     "release_owned: requested type u16, but the holder tracks u8"
/// );
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, Error)]
#[display("{operation}: {kind}")]
pub struct HolderError {
    operation: Operation,
    kind: HolderErrorKind,
}

impl HolderError {
    pub(crate) fn new(operation: Operation, kind: HolderErrorKind) -> Self {
        Self { operation, kind }
    }

    /// The operation that failed.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The precondition that did not hold.
    #[must_use]
    pub fn kind(&self) -> HolderErrorKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;
    use crate::DefaultDelete;

    #[test]
    fn test_display() {
        let error = HolderError::new(
            Operation::ReleaseOwnedCustom,
            HolderErrorKind::DeleterMismatch {
                requested: TypeDescriptor::of::<DefaultDelete>(),
                held: None,
            },
        );
        assert_eq!(
            error.to_string(),
            "release_owned_custom: requested deleter smartholder::deleters::DefaultDelete, but \
             the holder tracks no custom deleter"
        );

        let error = HolderError::new(
            Operation::ReleaseOwned,
            HolderErrorKind::NonExclusive { share_count: 3 },
        );
        assert_eq!(
            error.to_string(),
            "release_owned: the object is shared by 3 handles"
        );

        let error = HolderError::new(Operation::Borrow, HolderErrorKind::Empty);
        assert_eq!(error.to_string(), "borrow: the holder is empty");
    }

    #[test]
    fn test_display_custom_path_with_default_delete() {
        let error = HolderError::new(
            Operation::ReleaseOwned,
            HolderErrorKind::DeleterMismatch {
                requested: TypeDescriptor::of::<DefaultDelete>(),
                held: Some(TypeDescriptor::of::<DefaultDelete>()),
            },
        );
        assert_eq!(
            error.to_string(),
            "release_owned: requested deleter smartholder::deleters::DefaultDelete, but the \
             object was acquired through the custom-deleter path with \
             smartholder::deleters::DefaultDelete"
        );
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(
            Operation::AcquireOwnedCustom.to_string(),
            "acquire_owned_custom"
        );
        assert_eq!(Operation::AcquireShared.to_string(), "acquire_shared");
        assert_eq!(Operation::ReleaseOwnedRaw.to_string(), "release_owned_raw");
    }

    #[test]
    fn test_error_traits() {
        static_assertions::assert_impl_all!(HolderError: core::error::Error, Send, Sync, Copy);

        let error = HolderError::new(Operation::AsShared, HolderErrorKind::Empty);
        assert!(core::error::Error::source(&error).is_none());
    }
}
