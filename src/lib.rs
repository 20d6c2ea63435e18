#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Extra checks on nightly
#![cfg_attr(nightly_extra_checks, feature(rustdoc_missing_doc_code_examples))]
#![cfg_attr(nightly_extra_checks, forbid(rustdoc::missing_doc_code_examples))]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A type-erased holder that moves native objects between ownership regimes
//! without ever destroying them twice.
//!
//! ## Overview
//!
//! Code that hands native objects to a foreign runtime (a scripting language,
//! a plugin host, a garbage-collected embedding) often cannot know the
//! concrete type of every object at compile time, and cannot rely on the
//! borrow checker to decide who destroys what. A [`SmartHolder`] fills that
//! gap: it is one uniform slot that can track an object under any of four
//! ownership regimes, and convert between them at runtime:
//!
//! - **Unowned**: the object is owned elsewhere and never destroyed by the
//!   holder ([`SmartHolder::acquire_unowned`]).
//! - **Owned with default destruction**: the holder owns a [`Box`]
//!   ([`SmartHolder::acquire_owned`]).
//! - **Owned with a custom deleter**: the holder owns a [`Unique<T, D>`]
//!   together with its destruction action
//!   ([`SmartHolder::acquire_owned_custom`]).
//! - **Shared**: the holder is one of the owners of a reference-counted
//!   [`Shared<T>`] ([`SmartHolder::acquire_shared`]).
//!
//! ## Quick Example
//!
//! ```
//! use smartholder::{HolderErrorKind, SmartHolder};
//!
//! #[derive(Debug, PartialEq)]
//! struct Widget {
//!     id: u32,
//! }
//!
//! let mut holder: SmartHolder = SmartHolder::new();
//! holder.acquire_owned(Box::new(Widget { id: 7 }));
//!
//! // Typed access checks the type at runtime
//! assert_eq!(holder.borrow::<Widget>().unwrap().id, 7);
//! assert!(holder.borrow::<String>().is_err());
//!
//! // Sharing the object blocks exclusive release
//! let shared = holder.as_shared::<Widget>().unwrap();
//! assert_eq!(shared.share_count(), 2);
//! assert!(matches!(
//!     holder.release_owned::<Widget>().unwrap_err().kind(),
//!     HolderErrorKind::NonExclusive { share_count: 2 }
//! ));
//!
//! drop(shared);
//! let widget = holder.release_owned::<Widget>().unwrap();
//! assert_eq!(*widget, Widget { id: 7 });
//! ```
//!
//! ## Core Concepts
//!
//! Every acquisition stores the object in a reference-counted control block
//! together with its destruction action and a liveness flag. The holder keeps
//! one reference to the block; [`Shared`] handles obtained through
//! [`SmartHolder::as_shared`] keep others. When the last reference goes away,
//! the control block runs the destruction action, but only if the liveness
//! flag is still set.
//!
//! Releasing exclusive ownership with [`SmartHolder::release_owned`] or
//! [`SmartHolder::release_owned_custom`] clears the flag before handing the
//! object back, so the caller's own lifetime management takes over and the
//! control block never destroys the object a second time. A release is only
//! allowed while the holder's reference is the only one.
//!
//! The object's type is recorded as a [`TypeDescriptor`], a canonical entry
//! in a process-wide registry. Typed accessors compare descriptors before
//! casting, and a mismatch is always reported as a [`HolderError`], never
//! coerced.
//!
//! ## Thread Safety
//!
//! [`SmartHolder<SendSync>`](SmartHolder) (the default) only accepts objects
//! and deleters that are `Send + Sync`, and is itself `Send + Sync`.
//! [`SmartHolder<Local>`](SmartHolder) accepts any `'static` object but stays
//! on its thread. See [`markers`] for details.
//!
//! ## Logging
//!
//! Acquisitions and releases emit `trace` events, and failed preconditions
//! emit `debug` events, through the [`tracing`] crate. Install any subscriber
//! to see them.
//!
//! ## Features
//!
//! - `std`: Use `std::sync::RwLock` instead of a spin lock for the type
//!   registry.
//!
//! For implementation details, see the [`smartholder-internals`] crate.
//!
//! [`smartholder-internals`]: smartholder_internals
//! [`Local`]: crate::markers::Local
//! [`SendSync`]: crate::markers::SendSync
//! [`tracing`]: https://docs.rs/tracing

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod deleters;
pub mod markers;

mod descriptor;
mod error;
mod holder;
mod registry_lock;
mod shared;
mod unique;

pub use self::{
    deleters::{DefaultDelete, Deleter, NoDelete},
    descriptor::TypeDescriptor,
    error::{HolderError, HolderErrorKind, Operation},
    holder::SmartHolder,
    shared::Shared,
    unique::Unique,
};
