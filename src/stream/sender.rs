use core::fmt;

use alloc::boxed::Box;
#[cfg(not(loom))]
use alloc::sync::Arc;
#[cfg(loom)]
use loom::sync::Arc;

use super::{Shared, Termination};
use crate::policy::SendOutcome;

/// The sending-half of [`stream::channel`](super::channel).
///
/// Senders are cheap to clone; any number of producers may send
/// concurrently with each other and with the consumer. Dropping every
/// sender does *not* finish the stream - call [`finish`](Sender::finish)
/// explicitly.
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Sender<T> {
    pub(super) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared }
    }

    /// Sends `value` to the consumer, reporting the outcome synchronously.
    ///
    /// If the consumer is suspended waiting for a value, it is resumed with
    /// `value` directly and the buffer is left untouched. Otherwise the
    /// buffering policy decides between enqueueing, displacing the oldest
    /// buffered value, and rejecting `value` - a rejected or displaced
    /// value is handed back inside the [`SendOutcome`] rather than silently
    /// dropped.
    ///
    /// After the stream is terminal every send returns
    /// [`SendOutcome::Terminated`] and discards the value.
    pub fn send(&self, value: T) -> SendOutcome<T> {
        self.shared.send(value)
    }

    /// Puts the stream into its terminal state.
    ///
    /// The consumer keeps draining already-buffered values and observes the
    /// end of the stream only once the buffer is empty. Idempotent: only
    /// the first terminal transition is observable.
    pub fn finish(&self) {
        self.shared.finish();
    }

    /// Registers `handler` to be invoked exactly once when the stream
    /// becomes terminal, with the reason: [`Termination::Finished`] after
    /// an explicit finish, or [`Termination::Cancelled`] when the consumer
    /// goes away first.
    ///
    /// A subsequent registration replaces the previous handler. A handler
    /// registered after the stream is already terminal fires with
    /// [`Termination::Cancelled`] when the stream storage is dropped.
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

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}
