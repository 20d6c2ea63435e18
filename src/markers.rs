//! Marker types and traits for defining thread-safety semantics.
//!
//! The markers in this module appear as the `TS` type parameter of
//! [`SmartHolder<TS>`](crate::SmartHolder) and
//! [`Shared<T, TS>`](crate::Shared). They encode at compile time whether the
//! tracked objects, and therefore the holder itself, may cross thread
//! boundaries.
//!
//! - [`SendSync`]: Every tracked object and every destruction action is `Send
//!   + Sync`, so the holder and its shared handles are `Send + Sync` too.
//! - [`Local`]: Tracked objects may be non-thread-safe (`Rc`, raw pointers,
//!   `Cell`), and the holder is neither `Send` nor `Sync`.
//!
//! The constraint is enforced at acquisition time: it is impossible to put a
//! `T` that is not `Send + Sync` into a `SmartHolder<SendSync>`, because every
//! acquisition requires `T: ObjectMarkerFor<SendSync>`.
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//!
//! use smartholder::{SmartHolder, markers::Local};
//!
//! let mut holder: SmartHolder = SmartHolder::new();
//! holder.acquire_owned(Box::new(String::from("thread-safe")));
//!
//! std::thread::spawn(move || {
//!     assert_eq!(holder.borrow::<String>().unwrap(), "thread-safe");
//! })
//! .join()
//! .unwrap();
//!
//! let mut local: SmartHolder<Local> = SmartHolder::new();
//! local.acquire_owned(Box::new(Rc::new(5)));
//! // `local` cannot be sent to another thread
//! ```

/// Marker type indicating that a holder and everything it tracks is `Send +
/// Sync`.
///
/// This is the default thread-safety marker. Objects and deleters acquired
/// into a `SmartHolder<SendSync>` must be `Send + Sync`.
///
/// ```compile_fail
/// use std::rc::Rc;
///
/// use smartholder::SmartHolder;
///
/// let mut holder: SmartHolder = SmartHolder::new();
/// holder.acquire_owned(Box::new(Rc::new(5)));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct SendSync;

/// Marker type indicating that a holder may track objects that are neither
/// `Send` nor `Sync`.
///
/// A `SmartHolder<Local>` accepts any `'static` type, at the cost of being
/// confined to the thread that created it. Shared handles can be converted
/// from [`SendSync`] to [`Local`] with
/// [`Shared::into_local`](crate::Shared::into_local).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Local;

mod sealed_thread_safety_marker {
    use super::*;

    pub trait Sealed: 'static {}

    impl Sealed for SendSync {}
    impl Sealed for Local {}
}

/// Trait implemented by the thread-safety markers [`SendSync`] and [`Local`].
///
/// This trait is sealed and cannot be implemented outside of this crate.
pub trait ThreadSafetyMarker: sealed_thread_safety_marker::Sealed {
    /// Human readable name of the marker, used in log events.
    #[doc(hidden)]
    const NAME: &'static str;
}

impl ThreadSafetyMarker for SendSync {
    const NAME: &'static str = "SendSync";
}

impl ThreadSafetyMarker for Local {
    const NAME: &'static str = "Local";
}

/// Marker trait combining an object type with a thread-safety marker.
///
/// - For `TS = Local`: Implemented for all `Sized + 'static` types.
/// - For `TS = SendSync`: Implemented only for `Sized + 'static` types that
///   are `Send + Sync`.
///
/// Tracked objects and deleters must satisfy this bound for the holder's
/// marker, which is what makes the `Send`/`Sync` implementations of
/// `SmartHolder<SendSync>` and `Shared<T, SendSync>` sound.
///
/// ```compile_fail
/// use std::cell::Cell;
///
/// use smartholder::Shared;
///
/// let shared: Shared<Cell<u8>> = Shared::new(Cell::new(1));
/// ```
pub trait ObjectMarkerFor<TS>: Sized + 'static {}

impl<O: Sized + 'static> ObjectMarkerFor<Local> for O {}

impl<O: Sized + 'static> ObjectMarkerFor<SendSync> for O where O: Send + Sync {}
