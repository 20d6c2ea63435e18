//! Module containing the reference-counted handle data structure

mod data;
mod raw;
mod vtable;

pub use raw::{RawHandle, RawHandleRef};
