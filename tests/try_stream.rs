#![cfg(not(loom))]

use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::prelude::*;
use futures::stream::FusedStream;
use futures::task::{waker, ArcWake};

use spout::policy::{BufferPolicy, SendOutcome};
use spout::try_stream::{channel, with_producer, Termination, TryNextError};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Boom;

struct Counter(AtomicUsize);

impl ArcWake for Counter {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.fetch_add(1, SeqCst);
    }
}

fn counter() -> Arc<Counter> {
    Arc::new(Counter(AtomicUsize::new(0)))
}

#[test]
fn error_is_delivered_once_after_drain() {
    let count = counter();
    let wake = waker(Arc::clone(&count));
    let mut cx = Context::from_waker(&wake);
    let (tx, mut rx) = channel::<u32, Boom>(BufferPolicy::Unbounded);
    tx.send(1);
    tx.send(2);
    tx.finish_err(Boom);
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Ready(Some(Ok(1))));
    assert!(!rx.is_terminated());
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Ready(Some(Ok(2))));
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Ready(Some(Err(Boom))));
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Ready(None));
    assert!(rx.is_terminated());
}

#[test]
fn first_terminal_reason_wins() {
    let count = counter();
    let wake = waker(Arc::clone(&count));
    let mut cx = Context::from_waker(&wake);
    let (tx, mut rx) = channel::<u32, Boom>(BufferPolicy::Unbounded);
    tx.finish();
    tx.finish_err(Boom);
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Ready(None));
}

#[test]
fn failure_wakes_a_suspended_consumer() {
    let count = counter();
    let wake = waker(Arc::clone(&count));
    let mut cx = Context::from_waker(&wake);
    let (tx, mut rx) = channel::<u32, Boom>(BufferPolicy::Unbounded);
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Pending);
    tx.finish_err(Boom);
    assert_eq!(count.0.load(SeqCst), 1);
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Ready(Some(Err(Boom))));
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Ready(None));
}

#[test]
fn sends_after_failure_are_noops() {
    let (tx, mut rx) = channel::<u32, Boom>(BufferPolicy::Unbounded);
    tx.finish_err(Boom);
    assert!(tx.is_finished());
    assert_eq!(tx.send(1), SendOutcome::Terminated);
    assert_eq!(rx.try_next(), Ok(Err(Boom)));
    assert_eq!(rx.try_next(), Err(TryNextError::Finished));
}

#[test]
fn callback_observes_the_reason_once() {
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let (tx, mut rx) = channel::<u32, Boom>(BufferPolicy::Unbounded);
    let recorded = Arc::clone(&reasons);
    tx.on_termination(move |reason| recorded.lock().unwrap().push(reason));
    tx.finish_err(Boom);
    tx.finish();
    rx.cancel();
    assert_eq!(*reasons.lock().unwrap(), [Termination::Finished]);
}

#[test]
fn cancel_discards_a_later_error() {
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let count = counter();
    let wake = waker(Arc::clone(&count));
    let mut cx = Context::from_waker(&wake);
    let (tx, mut rx) = channel::<u32, Boom>(BufferPolicy::Unbounded);
    let recorded = Arc::clone(&reasons);
    tx.on_termination(move |reason| recorded.lock().unwrap().push(reason));
    rx.cancel();
    tx.finish_err(Boom);
    assert_eq!(*reasons.lock().unwrap(), [Termination::Cancelled]);
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Ready(None));
}

#[test]
fn buffered_values_survive_cancellation() {
    let count = counter();
    let wake = waker(Arc::clone(&count));
    let mut cx = Context::from_waker(&wake);
    let (tx, mut rx) = channel::<u32, Boom>(BufferPolicy::Unbounded);
    tx.send(1);
    rx.cancel();
    assert_eq!(tx.send(2), SendOutcome::Terminated);
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Ready(Some(Ok(1))));
    assert_eq!(Pin::new(&mut rx).poll_next(&mut cx), Poll::Ready(None));
}

#[test]
fn backpressure_applies_independently_of_failures() {
    let limit = NonZeroUsize::new(2).unwrap();
    let (tx, mut rx) = channel::<u32, Boom>(BufferPolicy::KeepNewest(limit));
    tx.send(1);
    tx.send(2);
    assert_eq!(tx.send(3), SendOutcome::Enqueued { remaining: 0, evicted: Some(1) });
    tx.finish_err(Boom);
    assert_eq!(rx.try_next(), Ok(Ok(2)));
    assert_eq!(rx.try_next(), Ok(Ok(3)));
    assert_eq!(rx.try_next(), Ok(Err(Boom)));
    assert_eq!(rx.try_next(), Err(TryNextError::Finished));
}

#[test]
fn with_producer_collects_results() {
    let rx = with_producer::<u32, Boom, _>(BufferPolicy::default(), |tx| {
        tx.send(1);
        tx.finish_err(Boom);
    });
    let collected = futures::executor::block_on(rx.collect::<Vec<_>>());
    assert_eq!(collected, [Ok(1), Err(Boom)]);
}
