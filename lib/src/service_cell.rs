//! Single-registration cell for kernel service tables.

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

/// Holds a pointer to a `'static` table of function pointers. The first
/// registration wins; later registrations are rejected rather than
/// panicking so boot can keep going with the original provider.
pub struct ServiceCell<T> {
    ptr: AtomicPtr<T>,
    name: &'static str,
}

// SAFETY: only stores pointers to 'static T; AtomicPtr synchronizes access.
unsafe impl<T> Sync for ServiceCell<T> {}

impl<T> ServiceCell<T> {
    /// `name` identifies the cell in log output.
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
            name,
        }
    }

    /// Register the service table. Returns `true` if this call installed
    /// the table, `false` if another provider got there first.
    #[inline]
    pub fn register(&self, services: &'static T) -> bool {
        self.ptr
            .compare_exchange(
                ptr::null_mut(),
                services as *const T as *mut T,
                Ordering::Release,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        !self.ptr.load(Ordering::Acquire).is_null()
    }

    /// Current service table, or `None` before registration.
    #[inline]
    pub fn get(&self) -> Option<&'static T> {
        let ptr = self.ptr.load(Ordering::Acquire);
        if ptr.is_null() {
            None
        } else {
            // SAFETY: register only stores valid &'static T pointers.
            Some(unsafe { &*ptr })
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}
