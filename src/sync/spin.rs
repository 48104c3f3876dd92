//! A minimal spin lock.
//!
//! # Memory footprint
//!
//! The lock is a single [`AtomicBool`] living in the same allocation as the
//! data it protects. There is no separate lock object and no extra
//! indirection on lock/unlock.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

#[cfg(not(loom))]
use core::sync::atomic::{AtomicBool, Ordering::*};
#[cfg(loom)]
use loom::sync::atomic::{AtomicBool, Ordering::*};

/// A mutual exclusion primitive useful for protecting shared data.
///
/// Acquisition spins. Critical sections guarded by this lock must stay
/// O(1): no blocking, no I/O, no calls back into user code while the guard
/// is alive.
pub struct Spinlock<T> {
    lock: AtomicBool,
    data: UnsafeCell<T>,
}

/// An RAII implementation of a "scoped lock" of a spin lock. When this
/// structure is dropped (falls out of scope), the lock will be unlocked.
///
/// The data protected by the lock can be accessed through this guard via
/// its [`Deref`] and [`DerefMut`] implementations.
///
/// This structure is created by the [`lock`](Spinlock::lock) and
/// [`try_lock`](Spinlock::try_lock) methods on [`Spinlock`].
#[must_use]
pub struct SpinlockGuard<'a, T: 'a> {
    lock: &'a Spinlock<T>,
}

unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    /// Creates a new spin lock in an unlocked state ready for use.
    ///
    /// # Examples
    ///
    /// ```
    /// use spout::sync::Spinlock;
    ///
    /// let lock = Spinlock::new(0);
    /// ```
    #[cfg(not(loom))]
    #[inline]
    pub const fn new(data: T) -> Self {
        Self { lock: AtomicBool::new(false), data: UnsafeCell::new(data) }
    }

    #[cfg(loom)]
    pub fn new(data: T) -> Self {
        Self { lock: AtomicBool::new(false), data: UnsafeCell::new(data) }
    }

    /// Acquires this lock, spinning until it becomes available.
    ///
    /// Returns a RAII guard; the lock is released when the guard is
    /// dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use spout::sync::Spinlock;
    ///
    /// let lock = Spinlock::new(1);
    /// assert_eq!(*lock.lock(), 1);
    /// ```
    #[inline]
    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        loop {
            if let Some(guard) = self.try_lock() {
                break guard;
            }
            while self.lock.load(Relaxed) {
                #[cfg(not(loom))]
                core::hint::spin_loop();
                #[cfg(loom)]
                loom::thread::yield_now();
            }
        }
    }

    /// Attempts to acquire this lock.
    ///
    /// If the lock could not be acquired at this time, `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use spout::sync::Spinlock;
    ///
    /// let lock = Spinlock::new(1);
    /// let guard = lock.try_lock().unwrap();
    /// assert!(lock.try_lock().is_none());
    /// drop(guard);
    /// assert!(lock.try_lock().is_some());
    /// ```
    #[inline]
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_, T>> {
        if self.lock.swap(true, Acquire) { None } else { Some(SpinlockGuard { lock: self }) }
    }

    /// Consumes this lock, returning the underlying data.
    #[inline]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    /// Returns a mutable reference to the underlying data.
    ///
    /// Since this call borrows the lock mutably, no actual locking needs to
    /// take place - the mutable borrow statically guarantees no guards
    /// exist.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

impl<T: Default> Default for Spinlock<T> {
    /// Creates a `Spinlock<T>`, with the `Default` value for `T`.
    #[inline]
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<'a, T> Deref for SpinlockGuard<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> DerefMut for SpinlockGuard<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T> Drop for SpinlockGuard<'a, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.lock.store(false, Release);
    }
}
