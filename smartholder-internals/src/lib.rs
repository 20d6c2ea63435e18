#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`smartholder`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased handle and the unsafe
//! operations that power the [`smartholder`] ownership holder. It provides a
//! reference-counted handle whose pointee type and destruction action have
//! been erased, together with a liveness flag that disarms the destruction
//! action when ownership is handed back.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`smartholder`] crate,
//! not this one.
//!
//! # Architecture
//!
//! - **[`handle`]**: Type-erased, reference-counted handle storage
//!   - [`RawHandle`]: Owned handle with [`Arc`]-based allocation
//!   - [`RawHandleRef`]: Borrowed reference to a handle
//!   - [`HandleData`]: `#[repr(C)]` control block holding the erased pointer,
//!     the liveness flag and the deleter
//!   - [`HandleVtable`]: Function pointers for type-erased dispatch
//!
//! - **[`deleter`]**: The [`Deleter`] trait describing destruction actions
//!
//! # Safety Strategy
//!
//! When we erase a `HandleData<T, D>` to a pointer to its header, we must
//! ensure that the vtable function pointers still match the actual pointee
//! and deleter types stored in the allocation.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single file
//! - **`#[repr(C)]` layout**: The type-independent header sits at offset zero,
//!   so it can be read without knowing `T` or `D`
//! - **Documented vtable contracts**: Each vtable method specifies exactly when
//!   it can be safely called
//!
//! [`smartholder`]: https://docs.rs/smartholder/latest/smartholder/
//! [`HandleData`]: handle::data::HandleData
//! [`HandleVtable`]: handle::vtable::HandleVtable
//! [`Deleter`]: deleter::Deleter
//! [`Arc`]: triomphe::Arc

extern crate alloc;

pub mod deleter;
mod handle;

pub use handle::{RawHandle, RawHandleRef};
