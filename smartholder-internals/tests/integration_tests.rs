//! Integration tests for the smartholder-internals crate.
//!
//! These tests exercise the public surface of the crate: creating handles with
//! various deleters, sharing them and splitting them back into their parts.
//!
//! ## Deletion Tests
//! - `test_armed_handle_runs_deleter_once`: Deleter runs exactly once when the
//!   last reference goes away
//! - `test_disarmed_at_creation_never_runs_deleter`: Handles created disarmed
//!   leave the pointee alone
//! - `test_split_after_clones_are_gone`: Splitting waits for every clone, and
//!   the split handle never runs its deleter
//! - `test_deleter_dropped_without_running`: A deleter handed back by a split
//!   can be dropped without being invoked
//!
//! ## Splitting Tests
//! - `test_try_into_parts_unique`: A unique handle yields pointer and deleter
//! - `test_try_into_parts_shared`: A shared handle is returned unchanged
//!
//! ## Metadata Tests
//! - `test_type_metadata`: Type ids and names for pointee and deleter
//! - `test_fn_pointer_deleter`: Plain function pointers as deleters

use core::{
    any::TypeId,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};
use std::sync::Arc;

use smartholder_internals::{RawHandle, deleter::Deleter};

struct BoxDelete;

impl<T: 'static> Deleter<T> for BoxDelete {
    unsafe fn delete(self, ptr: NonNull<T>) {
        // SAFETY: Every pointer paired with this deleter in these tests comes
        // from `Box::into_raw`.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

/// A deleter that records how often it has run, and how often it has been
/// dropped, in shared counters.
struct Counting {
    runs: Arc<AtomicUsize>,
    drops: Arc<AtomicUsize>,
}

impl Drop for Counting {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: 'static> Deleter<T> for Counting {
    unsafe fn delete(self, ptr: NonNull<T>) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        // SAFETY: Every pointer paired with this deleter in these tests comes
        // from `Box::into_raw`.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

fn counting() -> (Counting, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let drops = Arc::new(AtomicUsize::new(0));
    (
        Counting {
            runs: runs.clone(),
            drops: drops.clone(),
        },
        runs,
        drops,
    )
}

fn leak<T>(value: T) -> NonNull<T> {
    NonNull::from(Box::leak(Box::new(value)))
}

#[test]
fn test_armed_handle_runs_deleter_once() {
    let (deleter, runs, drops) = counting();
    // SAFETY: The pointer comes from a leaked box
    let handle = unsafe { RawHandle::new(leak(String::from("armed")), deleter, true) };

    let clones: Vec<RawHandle> = (0..4).map(|_| handle.as_ref().clone_arc()).collect();
    assert_eq!(handle.as_ref().strong_count(), 5);

    drop(handle);
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    for (i, clone) in clones.into_iter().enumerate() {
        assert_eq!(clone.as_ref().strong_count(), 4 - i);
        drop(clone);
    }

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_disarmed_at_creation_never_runs_deleter() {
    let (deleter, runs, drops) = counting();
    let mut value = 17u32;

    // SAFETY: The handle is disarmed and `value` outlives it
    let handle = unsafe { RawHandle::new(NonNull::from(&mut value), deleter, false) };
    assert!(!handle.as_ref().is_armed());

    // SAFETY: The type matches and `value` is alive
    unsafe {
        assert_eq!(*handle.as_ref().pointee_downcast_unchecked::<u32>(), 17);
    }

    drop(handle);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(value, 17);
}

#[test]
fn test_split_after_clones_are_gone() {
    let (deleter, runs, drops) = counting();
    let ptr = leak(vec![1, 2, 3]);

    // SAFETY: The pointer comes from a leaked box
    let handle = unsafe { RawHandle::new(ptr, deleter, true) };
    let clone = handle.as_ref().clone_arc();

    // SAFETY: The types match
    let Err(handle) = (unsafe { handle.try_into_parts::<Vec<i32>, Counting>() }) else {
        panic!("a shared handle must not split");
    };
    assert!(clone.as_ref().is_armed());
    drop(clone);

    // SAFETY: The types match
    let Ok((out, deleter)) = (unsafe { handle.try_into_parts::<Vec<i32>, Counting>() }) else {
        panic!("the last handle must split");
    };
    assert_eq!(out, ptr);
    drop(deleter);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    // SAFETY: The split handed the allocation back to us
    let value = unsafe { Box::from_raw(out.as_ptr()) };
    assert_eq!(*value, vec![1, 2, 3]);
}

#[test]
fn test_deleter_dropped_without_running() {
    let (deleter, runs, drops) = counting();
    let ptr = leak(0u8);

    // SAFETY: The pointer comes from a leaked box
    let handle = unsafe { RawHandle::new(ptr, deleter, true) };

    // SAFETY: The types match
    let Ok((out, deleter)) = (unsafe { handle.try_into_parts::<u8, Counting>() }) else {
        panic!("a unique handle must split");
    };
    drop(deleter);

    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    // SAFETY: The split handed the allocation back to us
    drop(unsafe { Box::from_raw(out.as_ptr()) });
}

#[test]
fn test_try_into_parts_unique() {
    let (deleter, runs, drops) = counting();
    let ptr = leak(String::from("unique"));

    // SAFETY: The pointer comes from a leaked box
    let handle = unsafe { RawHandle::new(ptr, deleter, true) };

    // SAFETY: The types match
    let Ok((out, deleter)) = (unsafe { handle.try_into_parts::<String, Counting>() }) else {
        panic!("a unique handle must split");
    };
    assert_eq!(out, ptr);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    // SAFETY: Ownership was handed back together with the deleter
    unsafe { deleter.delete(out) };
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_try_into_parts_shared() {
    let ptr = leak(99i64);

    // SAFETY: The pointer comes from a leaked box
    let handle = unsafe { RawHandle::new(ptr, BoxDelete, true) };
    let clone = handle.as_ref().clone_arc();

    // SAFETY: The types match
    let Err(handle) = (unsafe { handle.try_into_parts::<i64, BoxDelete>() }) else {
        panic!("a shared handle must not split");
    };

    assert!(handle.as_ref().is_armed());
    assert_eq!(handle.as_ref().strong_count(), 2);
    assert_eq!(clone.as_ref().pointee_ptr(), ptr.cast::<()>());
}

#[test]
fn test_type_metadata() {
    // SAFETY: The pointer comes from a leaked box
    let handle = unsafe { RawHandle::new(leak(1.5f64), BoxDelete, true) };
    let handle_ref = handle.as_ref();

    assert_eq!(handle_ref.pointee_type_id(), TypeId::of::<f64>());
    assert_eq!(handle_ref.deleter_type_id(), TypeId::of::<BoxDelete>());
    assert!(handle_ref.deleter_type_name().ends_with("BoxDelete"));
    assert_ne!(handle_ref.deleter_type_id(), TypeId::of::<Counting>());
}

#[test]
fn test_fn_pointer_deleter() {
    static FREED: AtomicUsize = AtomicUsize::new(0);

    unsafe fn free_u16(ptr: NonNull<u16>) {
        FREED.fetch_add(1, Ordering::SeqCst);
        // SAFETY: The pointer comes from `Box::into_raw`
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }

    let deleter: unsafe fn(NonNull<u16>) = free_u16;
    // SAFETY: The pointer comes from a leaked box
    let handle = unsafe { RawHandle::new(leak(3u16), deleter, true) };
    assert_eq!(
        handle.as_ref().deleter_type_id(),
        TypeId::of::<unsafe fn(NonNull<u16>)>()
    );

    drop(handle);
    assert_eq!(FREED.load(Ordering::SeqCst), 1);
}
