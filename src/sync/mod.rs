//! Useful synchronization primitives.

pub mod spin;

pub use self::spin::{Spinlock, SpinlockGuard};
