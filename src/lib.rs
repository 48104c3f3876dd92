//! An asynchronous single-producer, single-consumer stream buffer.
//!
//! This crate bridges push-style value production with pull-style
//! asynchronous consumption. A producer emits values synchronously, possibly
//! from any thread, through a cloneable [`Sender`](stream::Sender) handle; a
//! single consumer drives a [`Receiver`](stream::Receiver), which implements
//! [`Stream`](futures::stream::Stream) and suspends while no value is
//! available.
//!
//! Two flavors are provided, sharing one design:
//!
//! * [`stream`] - the non-failing flavor, yielding `T`;
//! * [`try_stream`] - the failure-capable flavor, yielding `Result<T, E>`,
//!   where the error is delivered to the consumer exactly once at the point
//!   the buffered values run out.
//!
//! What happens when a value arrives while the buffer is full is governed by
//! a [`BufferPolicy`](policy::BufferPolicy): grow without bound, drop the
//! incoming value, or displace the oldest buffered value. The producer
//! learns the outcome of every send synchronously, so no value is ever lost
//! silently.
//!
//! # Example
//!
//! ```
//! use futures::prelude::*;
//! use spout::policy::BufferPolicy;
//! use spout::stream;
//!
//! let (tx, rx) = stream::channel::<u32>(BufferPolicy::Unbounded);
//! tx.send(1);
//! tx.send(2);
//! tx.finish();
//! let collected = futures::executor::block_on(rx.collect::<Vec<_>>());
//! assert_eq!(collected, [1, 2]);
//! ```

#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod policy;
pub mod stream;
pub mod sync;
pub mod try_stream;
