//! Buffering policies and send outcomes.
//!
//! A [`BufferPolicy`] decides what happens when a value arrives while the
//! pending buffer is at capacity. The decision logic is a pure function of
//! the policy and the current buffer length, independent of the locking
//! protocol that applies it.

use core::num::NonZeroUsize;

/// The rule governing an incoming value when the pending buffer is full.
///
/// A policy is chosen at stream construction time and never changes
/// afterwards.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BufferPolicy {
    /// The buffer grows without bound; every value is admitted.
    Unbounded,
    /// Keep the earliest `limit` values; once full, reject newly arriving
    /// values.
    KeepOldest(NonZeroUsize),
    /// Keep the newest `limit` values; once full, displace the oldest
    /// buffered value to admit a new one.
    KeepNewest(NonZeroUsize),
}

/// What a [`BufferPolicy`] decided about an incoming value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Decision {
    /// Room is available; push the value to the back of the buffer.
    Admit,
    /// The buffer is full; pop the front value, then push the new one.
    Displace,
    /// The buffer is full; return the value to the producer.
    Reject,
}

/// The outcome of a send, reported to the producer synchronously.
#[derive(PartialEq, Eq, Debug)]
pub enum SendOutcome<T> {
    /// The value was accepted.
    Enqueued {
        /// Buffer capacity still available, saturating to [`usize::MAX`]
        /// for [`BufferPolicy::Unbounded`].
        remaining: usize,
        /// The oldest buffered value displaced by this send under
        /// [`BufferPolicy::KeepNewest`], returned so it is not silently
        /// lost.
        evicted: Option<T>,
    },
    /// The sent value itself was rejected by [`BufferPolicy::KeepOldest`]
    /// at capacity; it is handed back to the caller.
    Dropped(T),
    /// The stream had already reached its terminal state; the value is
    /// discarded.
    Terminated,
}

impl BufferPolicy {
    /// Decides the fate of an incoming value given `queued` values already
    /// buffered.
    pub(crate) fn decide(self, queued: usize) -> Decision {
        match self {
            Self::Unbounded => Decision::Admit,
            Self::KeepOldest(limit) => {
                if queued < limit.get() {
                    Decision::Admit
                } else {
                    Decision::Reject
                }
            }
            Self::KeepNewest(limit) => {
                if queued < limit.get() {
                    Decision::Admit
                } else {
                    Decision::Displace
                }
            }
        }
    }

    /// Returns the capacity left with `queued` values buffered.
    pub(crate) fn remaining(self, queued: usize) -> usize {
        match self {
            Self::Unbounded => usize::MAX,
            Self::KeepOldest(limit) | Self::KeepNewest(limit) => {
                limit.get().saturating_sub(queued)
            }
        }
    }
}

impl Default for BufferPolicy {
    /// Returns [`BufferPolicy::Unbounded`].
    fn default() -> Self {
        Self::Unbounded
    }
}

impl<T> SendOutcome<T> {
    /// Returns `true` if the value was accepted.
    pub fn is_enqueued(&self) -> bool {
        matches!(self, Self::Enqueued { .. })
    }
}
