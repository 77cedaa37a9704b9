//! spinring - fixed-capacity ring buffer behind a single atomic spin lock
//!
//! [`RingStore`] is the plain circular array. [`ConcurrentQueue`] owns a
//! private copy of one and serializes every operation, including bulk drains,
//! through one compare-exchange flag. Full and empty are ordinary results,
//! never panics, so producers can retry or back off.
//!
//! ```
//! use spinring::{ConcurrentQueue, TryDequeueError};
//!
//! let queue = ConcurrentQueue::with_capacity(2).unwrap();
//! queue.try_enqueue("a").unwrap();
//! queue.try_enqueue("b").unwrap();
//! assert!(queue.try_enqueue("c").unwrap_err().is_full());
//!
//! let mut out = Vec::new();
//! queue.try_dequeue_all_into(&mut out).unwrap();
//! assert_eq!(out, ["a", "b"]);
//! assert_eq!(queue.try_dequeue(), Err(TryDequeueError::Empty));
//! ```
//!
//! Loom model tests run with `RUSTFLAGS="--cfg loom" cargo test --test loom_tests --release`.
#![warn(missing_docs)]

mod error;
pub mod lock;
mod queue;
mod store;
mod sync;
pub mod trace;

pub use error::{Contended, QueueError, TryDequeueError, TryEnqueueError};
pub use lock::{ContentionPolicy, LockTag};
pub use queue::{ConcurrentQueue, Drain};
pub use store::{RingStore, StoreDrain};
