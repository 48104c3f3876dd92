//! A buffered stream of values between synchronous producers and a single
//! asynchronous consumer.
//!
//! Producers push values through a cloneable [`Sender`] and eventually call
//! [`finish`](Sender::finish); the [`Receiver`] implements
//! [`Stream`](futures::stream::Stream) and yields the values in send order,
//! then `None` once the stream is terminal and drained.
//!
//! # Memory footprint
//!
//! A call to [`channel`] creates one allocation shared by both halves. It
//! holds the buffering policy, a word-sized spin lock, and the record the
//! lock protects.
//!
//! # Locked state structure
//!
//! The protected record consists of:
//!
//! * `pending` - FIFO of buffered, not-yet-delivered values; its length
//!   never exceeds the policy limit for bounded policies;
//! * `handoff` - a value handed directly to the waiting consumer, bypassing
//!   the buffer; occupied only while no waker is registered;
//! * `waker` - the waiting consumer; registered only while both value slots
//!   are empty and the stream is not terminal;
//! * `terminal` - set by [`finish`](Sender::finish) or by cancellation,
//!   never unset;
//! * `on_termination` - a one-shot callback, taken and invoked at most once
//!   over the stream's lifetime.
//!
//! Every operation acquires the lock, mutates the record, releases the
//! lock, and only then performs externally visible effects: waking the
//! consumer or invoking the termination callback.

mod receiver;
mod sender;

use alloc::boxed::Box;
use alloc::collections::VecDeque;
#[cfg(not(loom))]
use alloc::sync::Arc;
use core::task::{Context, Poll, Waker};

#[cfg(loom)]
use loom::sync::Arc;

pub use self::receiver::{Receiver, TryNextError};
pub use self::sender::Sender;
use crate::policy::{BufferPolicy, Decision, SendOutcome};
use crate::sync::Spinlock;

/// Creates a new stream, returning the sender/receiver halves.
///
/// All data sent on the [`Sender`] becomes available on the [`Receiver`] in
/// the same order as it was sent, subject to `policy` when the consumer
/// falls behind.
///
/// The [`Sender`] half is cheaply cloneable; any number of producers may
/// send concurrently. Only one [`Receiver`] exists, and it is the sole
/// consumer.
pub fn channel<T>(policy: BufferPolicy) -> (Sender<T>, Receiver<T>) {
    let shared = Arc::new(Shared::new(policy));
    let sender = Sender::new(Arc::clone(&shared));
    let receiver = Receiver::new(shared);
    (sender, receiver)
}

/// Creates a new stream, wiring the producer side up front.
///
/// `produce` is invoked exactly once with the [`Sender`] half before the
/// [`Receiver`] is returned, so the producer is in place before the first
/// value is awaited.
///
/// # Examples
///
/// ```
/// use futures::prelude::*;
/// use spout::policy::BufferPolicy;
/// use spout::stream;
///
/// let rx = stream::with_producer::<u32, _>(BufferPolicy::default(), |tx| {
///     tx.send(1);
///     tx.finish();
/// });
/// let collected = futures::executor::block_on(rx.collect::<Vec<_>>());
/// assert_eq!(collected, [1]);
/// ```
pub fn with_producer<T, F>(policy: BufferPolicy, produce: F) -> Receiver<T>
where
    F: FnOnce(Sender<T>),
{
    let (sender, receiver) = channel(policy);
    produce(sender);
    receiver
}

/// Reason the stream reached its terminal state, handed to the callback
/// registered with [`Sender::on_termination`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Termination {
    /// The producer side declared the end of the stream.
    Finished,
    /// The consumer side went away before the stream finished.
    Cancelled,
}

pub(crate) type TerminationHandler = Box<dyn FnOnce(Termination) + Send + 'static>;

pub(crate) struct Shared<T> {
    policy: BufferPolicy,
    state: Spinlock<State<T>>,
}

struct State<T> {
    pending: VecDeque<T>,
    handoff: Option<T>,
    waker: Option<Waker>,
    terminal: bool,
    on_termination: Option<TerminationHandler>,
}

impl<T> Shared<T> {
    fn new(policy: BufferPolicy) -> Self {
        let state = State {
            pending: VecDeque::new(),
            handoff: None,
            waker: None,
            terminal: false,
            on_termination: None,
        };
        Self { policy, state: Spinlock::new(state) }
    }

    pub(crate) fn send(&self, value: T) -> SendOutcome<T> {
        let mut state = self.state.lock();
        if state.terminal {
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

    /// Applies the buffering policy to `pending` with `value` incoming.
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

    pub(crate) fn finish(&self) {
        let mut state = self.state.lock();
        let handler = state.on_termination.take();
        state.terminal = true;
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
    ///
    /// Taking the callback atomically with the lock held is what keeps it
    /// one-shot when a cancel races an explicit finish: whichever call
    /// observes the slot first fires it, the other finds it empty.
    pub(crate) fn cancel(&self) {
        let handler = self.state.lock().on_termination.take();
        if let Some(handler) = handler {
            handler(Termination::Cancelled);
        }
        self.finish();
    }

    pub(crate) fn set_termination_handler(&self, handler: TerminationHandler) {
        let old = core::mem::replace(&mut self.state.lock().on_termination, Some(handler));
        drop(old);
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.state.lock().terminal
    }

    pub(crate) fn poll_next(&self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let mut state = self.state.lock();
        if let Some(value) = state.handoff.take() {
            return Poll::Ready(Some(value));
        }
        if let Some(value) = state.pending.pop_front() {
            return Poll::Ready(Some(value));
        }
        if state.terminal {
            return Poll::Ready(None);
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }

    pub(crate) fn try_next(&self) -> Result<T, TryNextError> {
        let mut state = self.state.lock();
        if let Some(value) = state.handoff.take() {
            return Ok(value);
        }
        if let Some(value) = state.pending.pop_front() {
            return Ok(value);
        }
        if state.terminal { Err(TryNextError::Finished) } else { Err(TryNextError::Empty) }
    }

    pub(crate) fn is_drained(&self) -> bool {
        let state = self.state.lock();
        state.terminal && state.handoff.is_none() && state.pending.is_empty()
    }
}

impl<T> Drop for State<T> {
    fn drop(&mut self) {
        // Last-resort cleanup: a callback still registered when the stream
        // storage goes away has never been observed by finish or cancel.
        if let Some(handler) = self.on_termination.take() {
            handler(Termination::Cancelled);
        }
    }
}
