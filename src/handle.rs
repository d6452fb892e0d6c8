//! Owned/borrowed native pointer primitive shared by all wrappers.
//!
//! Every safe wrapper in this crate holds exactly one opaque FFmpeg pointer.
//! `NativeHandle` captures the three states that pointer can be in: owned by
//! the wrapper (must be freed on teardown), borrowed from a caller (must only
//! be forgotten), or disposed (taken out, every further access fails).

use std::ptr::NonNull;

/// Ownership-tracked wrapper around one opaque native pointer.
///
/// Releasing a borrowed handle is unrepresentable: `release` only ever yields
/// a pointer out of the `Owned` state.
pub(crate) enum NativeHandle<T> {
    Owned(NonNull<T>),
    Borrowed(NonNull<T>),
    Disposed,
}

impl<T> NativeHandle<T> {
    pub fn owned(ptr: NonNull<T>) -> Self {
        NativeHandle::Owned(ptr)
    }

    pub fn borrowed(ptr: NonNull<T>) -> Self {
        NativeHandle::Borrowed(ptr)
    }

    /// Wrap a raw pointer, `None` if it is null.
    pub fn from_raw(ptr: *mut T, take_ownership: bool) -> Option<Self> {
        NonNull::new(ptr).map(|p| {
            if take_ownership {
                Self::owned(p)
            } else {
                Self::borrowed(p)
            }
        })
    }

    /// Current pointer, `None` once disposed.
    pub fn get(&self) -> Option<NonNull<T>> {
        match self {
            NativeHandle::Owned(p) | NativeHandle::Borrowed(p) => Some(*p),
            NativeHandle::Disposed => None,
        }
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, NativeHandle::Disposed)
    }

    pub fn owns(&self) -> bool {
        matches!(self, NativeHandle::Owned(_))
    }

    /// Take the pointer out for freeing. Idempotent: only the first call on an
    /// owned handle yields the pointer; a borrowed handle is detached without
    /// ever being yielded.
    pub fn release(&mut self) -> Option<NonNull<T>> {
        match std::mem::replace(self, NativeHandle::Disposed) {
            NativeHandle::Owned(p) => Some(p),
            NativeHandle::Borrowed(_) | NativeHandle::Disposed => None,
        }
    }
}
