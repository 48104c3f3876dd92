use core::fmt;
use core::pin::Pin;
use core::task::{Context, Poll};

#[cfg(not(loom))]
use alloc::sync::Arc;
#[cfg(loom)]
use loom::sync::Arc;

use futures::prelude::*;
use futures::stream::FusedStream;

use super::Shared;

/// The receiving-half of [`stream::channel`](super::channel).
///
/// This is the single consumer of the stream: it is not cloneable, and
/// polling requires exclusive access, so a second concurrent consumer is
/// impossible by construction.
///
/// Dropping the receiver cancels the stream: a registered termination
/// callback fires with [`Termination::Cancelled`](super::Termination) and
/// subsequent sends report
/// [`SendOutcome::Terminated`](crate::policy::SendOutcome).
pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

/// This enumeration is the list of the possible reasons that
/// [`Receiver::try_next`] could not return data when called.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TryNextError {
    /// The stream is currently empty, but not yet terminal, so data may yet
    /// become available.
    Empty,
    /// The stream is terminal and fully drained; there will never be any
    /// more data received on it.
    Finished,
}

impl<T> Receiver<T> {
    pub(super) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared }
    }

    /// Attempts to receive a value outside of the context of a task.
    ///
    /// Does not schedule a task wakeup or have any other side effects.
    ///
    /// A return value of `Err(TryNextError::Empty)` must be considered
    /// immediately stale (out of date), since producers run concurrently.
    pub fn try_next(&mut self) -> Result<T, TryNextError> {
        self.shared.try_next()
    }

    /// Cancels the stream without dropping the receiver.
    ///
    /// A registered termination callback fires exactly once with
    /// [`Termination::Cancelled`](super::Termination). Values still
    /// buffered remain available to this receiver.
    pub fn cancel(&mut self) {
        self.shared.cancel();
    }
}

impl<T> Stream for Receiver<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.shared.poll_next(cx)
    }
}

impl<T> FusedStream for Receiver<T> {
    fn is_terminated(&self) -> bool {
        self.shared.is_drained()
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver").finish_non_exhaustive()
    }
}

impl fmt::Display for TryNextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "stream is empty"),
            Self::Finished => write!(f, "stream is finished"),
        }
    }
}
