//! The failure-capable flavor of [`stream`](crate::stream).
//!
//! Identical to the non-failing flavor, except the producer may terminate
//! the stream with an error via [`Sender::finish_err`]. The consumer
//! receives buffered values first, then the error exactly once, after which
//! the stream behaves as cleanly finished.
//!
//! The terminal reason is recorded first-wins: once a stream has finished
//! (with or without an error) or been cancelled, a later finish call
//! changes nothing and its error argument is discarded.
//!
//! See [the non-failing flavor](crate::stream) for the locked state
//! structure; the only addition is that the terminal flag distinguishes
//! clean completion from failure and stores the pending error.

mod receiver;
mod sender;

use alloc::collections::VecDeque;
#[cfg(not(loom))]
use alloc::sync::Arc;
use core::task::{Context, Poll, Waker};

#[cfg(loom)]
use loom::sync::Arc;

pub use self::receiver::Receiver;
pub use self::sender::Sender;
pub use crate::stream::{Termination, TryNextError};

use crate::policy::{BufferPolicy, Decision, SendOutcome};
use crate::stream::TerminationHandler;
use crate::sync::Spinlock;

/// Creates a new failure-capable stream, returning the sender/receiver
/// halves.
///
/// All data sent on the [`Sender`] becomes available on the [`Receiver`] in
/// the same order as it was sent, subject to `policy` when the consumer
/// falls behind. The stream can be finished with an error, which the
/// consumer observes exactly once after draining the buffer.
pub fn channel<T, E>(policy: BufferPolicy) -> (Sender<T, E>, Receiver<T, E>) {
    let shared = Arc::new(Shared::new(policy));
    let sender = Sender::new(Arc::clone(&shared));
    let receiver = Receiver::new(shared);
    (sender, receiver)
}

/// Creates a new failure-capable stream, wiring the producer side up front.
///
/// `produce` is invoked exactly once with the [`Sender`] half before the
/// [`Receiver`] is returned.
pub fn with_producer<T, E, F>(policy: BufferPolicy, produce: F) -> Receiver<T, E>
where
    F: FnOnce(Sender<T, E>),
{
    let (sender, receiver) = channel(policy);
    produce(sender);
    receiver
}

enum Terminal<E> {
    /// Cleanly finished, or a stored error was already delivered.
    Finished,
    /// Finished with an error not yet delivered to the consumer.
    Failed(E),
}

pub(crate) struct Shared<T, E> {
    policy: BufferPolicy,
    state: Spinlock<State<T, E>>,
}

struct State<T, E> {
    pending: VecDeque<T>,
    handoff: Option<T>,
    waker: Option<Waker>,
    terminal: Option<Terminal<E>>,
    on_termination: Option<TerminationHandler>,
}

impl<T, E> Shared<T, E> {
    fn new(policy: BufferPolicy) -> Self {
        let state = State {
            pending: VecDeque::new(),
            handoff: None,
            waker: None,
            terminal: None,
            on_termination: None,
        };
        Self { policy, state: Spinlock::new(state) }
    }

    pub(crate) fn send(&self, value: T) -> SendOutcome<T> {
        let mut state = self.state.lock();
        if state.terminal.is_some() {
            return SendOutcome::Terminated;
        }
        if let Some(waker) = state.waker.take() {
            let outcome = if state.handoff.is_none() && state.pending.is_empty() {
                // Direct handoff: the value never touches the buffer, so
                // the remaining capacity is computed against an empty one.
                state.handoff = Some(value);
                SendOutcome::Enqueued { remaining: self.policy.remaining(0), evicted: None }
            } else {
                // A registered waker normally implies empty value slots.
                // Tolerate a stale registration: buffer per the policy,
                // then hand the oldest value over.
                let outcome = self.buffer(&mut state.pending, value);
                if state.handoff.is_none() {
                    state.handoff = state.pending.pop_front();
                }
                outcome
            };
            drop(state);
            waker.wake();
            return outcome;
        }
        self.buffer(&mut state.pending, value)
    }

    fn buffer(&self, pending: &mut VecDeque<T>, value: T) -> SendOutcome<T> {
        match self.policy.decide(pending.len()) {
            Decision::Admit => {
                pending.push_back(value);
                let remaining = self.policy.remaining(pending.len());
                SendOutcome::Enqueued { remaining, evicted: None }
            }
            Decision::Displace => {
                let evicted = pending.pop_front();
                pending.push_back(value);
                SendOutcome::Enqueued { remaining: 0, evicted }
            }
            Decision::Reject => SendOutcome::Dropped(value),
        }
    }

    pub(crate) fn finish(&self, error: Option<E>) {
        let mut state = self.state.lock();
        let handler = state.on_termination.take();
        if state.terminal.is_none() {
            // First terminal reason wins; a later finish never overwrites
            // an already-recorded reason and its error is discarded.
            state.terminal = Some(match error {
                Some(err) => Terminal::Failed(err),
                None => Terminal::Finished,
            });
        }
        let waker = state.waker.take();
        drop(state);
        if let Some(handler) = handler {
            handler(Termination::Finished);
        }
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Takes and fires the termination callback with
    /// [`Termination::Cancelled`], then finishes the stream.
    pub(crate) fn cancel(&self) {
        let handler = self.state.lock().on_termination.take();
        if let Some(handler) = handler {
            handler(Termination::Cancelled);
        }
        self.finish(None);
    }

    pub(crate) fn set_termination_handler(&self, handler: TerminationHandler) {
        let old = core::mem::replace(&mut self.state.lock().on_termination, Some(handler));
        drop(old);
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.state.lock().terminal.is_some()
    }

    pub(crate) fn poll_next(&self, cx: &mut Context<'_>) -> Poll<Option<Result<T, E>>> {
        let mut state = self.state.lock();
        if let Some(value) = state.handoff.take() {
            return Poll::Ready(Some(Ok(value)));
        }
        if let Some(value) = state.pending.pop_front() {
            return Poll::Ready(Some(Ok(value)));
        }
        match state.terminal.take() {
            Some(Terminal::Failed(err)) => {
                // The stored error is delivered once, then the stream
                // behaves as cleanly finished.
                state.terminal = Some(Terminal::Finished);
                Poll::Ready(Some(Err(err)))
            }
            Some(Terminal::Finished) => {
                state.terminal = Some(Terminal::Finished);
                Poll::Ready(None)
            }
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }

    pub(crate) fn try_next(&self) -> Result<Result<T, E>, TryNextError> {
        let mut state = self.state.lock();
        if let Some(value) = state.handoff.take() {
            return Ok(Ok(value));
        }
        if let Some(value) = state.pending.pop_front() {
            return Ok(Ok(value));
        }
        match state.terminal.take() {
            Some(Terminal::Failed(err)) => {
                state.terminal = Some(Terminal::Finished);
                Ok(Err(err))
            }
            Some(Terminal::Finished) => {
                state.terminal = Some(Terminal::Finished);
                Err(TryNextError::Finished)
            }
            None => Err(TryNextError::Empty),
        }
    }

    pub(crate) fn is_drained(&self) -> bool {
        let state = self.state.lock();
        matches!(state.terminal, Some(Terminal::Finished))
            && state.handoff.is_none()
            && state.pending.is_empty()
    }
}

impl<T, E> Drop for State<T, E> {
    fn drop(&mut self) {
        // Last-resort cleanup: a callback still registered when the stream
        // storage goes away has never been observed by finish or cancel.
        if let Some(handler) = self.on_termination.take() {
            handler(Termination::Cancelled);
        }
    }
}
