use core::fmt;
use core::pin::Pin;
use core::task::{Context, Poll};

#[cfg(not(loom))]
use alloc::sync::Arc;
#[cfg(loom)]
use loom::sync::Arc;

use futures::prelude::*;
use futures::stream::FusedStream;

use super::{Shared, TryNextError};

/// The receiving-half of [`try_stream::channel`](super::channel).
///
/// This is the single consumer of the stream: it is not cloneable, and
/// polling requires exclusive access, so a second concurrent consumer is
/// impossible by construction.
///
/// The stream yields `Ok(value)` for every delivered value; if the
/// producer finished with an error, `Err(error)` is yielded exactly once
/// after the buffer is drained, followed by the end of the stream.
///
/// Dropping the receiver cancels the stream.
pub struct Receiver<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Receiver<T, E> {
    pub(super) fn new(shared: Arc<Shared<T, E>>) -> Self {
        Self { shared }
    }

    /// Attempts to receive a value outside of the context of a task.
    ///
    /// Does not schedule a task wakeup or have any other side effects.
    ///
    /// A return value of `Err(TryNextError::Empty)` must be considered
    /// immediately stale (out of date), since producers run concurrently.
    pub fn try_next(&mut self) -> Result<Result<T, E>, TryNextError> {
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

impl<T, E> Stream for Receiver<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.shared.poll_next(cx)
    }
}

impl<T, E> FusedStream for Receiver<T, E> {
    fn is_terminated(&self) -> bool {
        self.shared.is_drained()
    }
}

impl<T, E> Drop for Receiver<T, E> {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

impl<T, E> fmt::Debug for Receiver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver").finish_non_exhaustive()
    }
}
