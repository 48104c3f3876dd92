use core::fmt;

use alloc::boxed::Box;
#[cfg(not(loom))]
use alloc::sync::Arc;
#[cfg(loom)]
use loom::sync::Arc;

use super::{Shared, Termination};
use crate::policy::SendOutcome;

/// The sending-half of [`try_stream::channel`](super::channel).
///
/// Senders are cheap to clone; any number of producers may send
/// concurrently with each other and with the consumer. Dropping every
/// sender does *not* finish the stream - call [`finish`](Sender::finish) or
/// [`finish_err`](Sender::finish_err) explicitly.
pub struct Sender<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Sender<T, E> {
    pub(super) fn new(shared: Arc<Shared<T, E>>) -> Self {
        Self { shared }
    }

    /// Sends `value` to the consumer, reporting the outcome synchronously.
    ///
    /// See [`stream::Sender::send`](crate::stream::Sender::send); the
    /// semantics are identical.
    pub fn send(&self, value: T) -> SendOutcome<T> {
        self.shared.send(value)
    }

    /// Puts the stream into its terminal state with no error.
    ///
    /// The consumer keeps draining already-buffered values and observes the
    /// end of the stream only once the buffer is empty. Only the first
    /// terminal transition is observable.
    pub fn finish(&self) {
        self.shared.finish(None);
    }

    /// Puts the stream into its terminal state with `error`.
    ///
    /// The consumer drains already-buffered values first, then receives
    /// `Err(error)` exactly once, then observes the end of the stream. If
    /// the stream was already terminal, `error` is discarded: the first
    /// terminal reason wins.
    pub fn finish_err(&self, error: E) {
        self.shared.finish(Some(error));
    }

    /// Registers `handler` to be invoked exactly once when the stream
    /// becomes terminal.
    ///
    /// The handler observes the reason only; a failure payload is reserved
    /// for the consumer, which receives it exactly once. A subsequent
    /// registration replaces the previous handler.
    pub fn on_termination<F>(&self, handler: F)
    where
        F: FnOnce(Termination) + Send + 'static,
    {
        self.shared.set_termination_handler(Box::new(handler));
    }

    /// Returns `true` if the stream has reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.shared.is_terminal()
    }
}

impl<T, E> Clone for Sender<T, E> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T, E> fmt::Debug for Sender<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}
