//! Thread-safe front end over a privately owned [`RingStore`].
//!
//! Every operation, bulk drains included, runs inside the same single
//! [`SpinLock`] critical section. Producers and consumers never overlap
//! inside the store.
//!
//! # Bulk drain and the final flush
//!
//! [`try_dequeue_all`] and [`try_dequeue_all_into`] take whatever is in the
//! store *at that moment*. A consumer looping on them while a producer is
//! still running can observe an empty store just before the producer's last
//! batch lands. To receive everything, the consumer must drain once more
//! after it has observed that producers are finished:
//!
//! 1. producers set a shared `done` flag (Release) after their last enqueue;
//! 2. the consumer reads `done` (Acquire) *before* draining;
//! 3. the consumer stops only after a drain that began once `done` was seen.
//!
//! [`drain_to_completion`] runs this loop.
//!
//! A drain holds the lock for its whole length, so a slow consumer of a
//! lazy [`Drain`] stalls every producer until the iterator is exhausted or
//! dropped.
//!
//! [`try_dequeue_all`]: ConcurrentQueue::try_dequeue_all
//! [`try_dequeue_all_into`]: ConcurrentQueue::try_dequeue_all_into
//! [`drain_to_completion`]: ConcurrentQueue::drain_to_completion

use core::fmt;
use core::iter::FusedIterator;
use std::sync::atomic::AtomicBool;

use crate::error::{Contended, QueueError, TryDequeueError, TryEnqueueError};
use crate::lock::{backoff, ContentionPolicy, LockGuard, LockTag, SpinLock};
use crate::store::RingStore;
use crate::sync::{AtomicUsize, Ordering, UnsafeCell};
use crate::trace::{debug, trace};

/// Bounded FIFO shared by any number of producer and consumer threads.
pub struct ConcurrentQueue<T> {
    store: UnsafeCell<RingStore<T>>,
    lock: SpinLock,
    policy: ContentionPolicy,
    capacity: usize,
    // mirror of the store's count, written only under the lock
    len: AtomicUsize,
}

unsafe impl<T: Send> Send for ConcurrentQueue<T> {}
// The store is only touched while `lock` is held.
unsafe impl<T: Send> Sync for ConcurrentQueue<T> {}

impl<T> ConcurrentQueue<T> {
    /// Empty queue holding at most `capacity` items, spinning on contention.
    pub fn with_capacity(capacity: usize) -> Result<Self, QueueError> {
        Ok(Self::from(RingStore::new(capacity)?))
    }

    /// Take ownership of `store` and use `policy` for every lock acquisition.
    pub fn with_policy(store: RingStore<T>, policy: ContentionPolicy) -> Self {
        debug!(capacity = store.capacity(), len = store.len(), ?policy, "queue created");
        ConcurrentQueue {
            len: AtomicUsize::new(store.len()),
            capacity: store.capacity(),
            store: UnsafeCell::new(store),
            lock: SpinLock::new(),
            policy,
        }
    }

    /// Enqueue `item`, or hand it back if the store is full.
    ///
    /// Under a bounded policy this can also fail with
    /// [`TryEnqueueError::Contended`].
    pub fn try_enqueue(&self, item: T) -> Result<(), TryEnqueueError<T>> {
        let Some(_guard) = self.acquire(LockTag::Enqueue) else {
            return Err(TryEnqueueError::Contended(item));
        };
        self.store.with_mut(|store| {
            // SAFETY: the guard gives exclusive access to the store.
            let store = unsafe { &mut *store };
            let result = store.enqueue(item).map_err(TryEnqueueError::Full);
            self.len.store(store.len(), Ordering::Relaxed);
            result
        })
    }

    /// Dequeue the oldest item.
    pub fn try_dequeue(&self) -> Result<T, TryDequeueError> {
        let _guard = self.acquire(LockTag::Dequeue).ok_or(TryDequeueError::Contended)?;
        self.store.with_mut(|store| {
            // SAFETY: the guard gives exclusive access to the store.
            let store = unsafe { &mut *store };
            let item = store.dequeue().ok_or(TryDequeueError::Empty);
            self.len.store(store.len(), Ordering::Relaxed);
            item
        })
    }

    /// Lock the queue and return an iterator that dequeues one item per step.
    ///
    /// The lock is held until the iterator reports the store empty or is
    /// dropped, whichever comes first.
    pub fn try_dequeue_all(&self) -> Result<Drain<'_, T>, Contended> {
        let guard = self.acquire(LockTag::Drain).ok_or(Contended)?;
        Ok(Drain { queue: self, guard: Some(guard), drained: 0 })
    }

    /// Move every item into `target` within one critical section.
    ///
    /// Returns how many items were moved; the store is empty afterwards even
    /// if `target`'s `Extend` impl stops pulling early. The lock is released
    /// even if that impl panics.
    pub fn try_dequeue_all_into<E>(&self, target: &mut E) -> Result<usize, Contended>
    where
        E: Extend<T>,
    {
        let _guard = self.acquire(LockTag::Drain).ok_or(Contended)?;
        let _publish = PublishLen(self);
        let drained = self.store.with_mut(|store| {
            // SAFETY: the guard gives exclusive access to the store.
            let store = unsafe { &mut *store };
            let mut moved = 0;
            target.extend(store.drain().inspect(|_| moved += 1));
            // whatever the first extend left behind
            while let Some(item) = store.dequeue() {
                target.extend(Some(item));
                moved += 1;
            }
            moved
        });
        trace!(drained, "drained into collection");
        Ok(drained)
    }

    /// Drain into `target` until `done` is set and a final flush has run.
    ///
    /// `done` must be set with `Release` ordering after the producers' last
    /// successful enqueue. Idle rounds back off with spin-then-yield. Returns
    /// the total number of items moved.
    pub fn drain_to_completion<E>(&self, done: &AtomicBool, target: &mut E) -> usize
    where
        E: Extend<T>,
    {
        let mut total = 0;
        let mut idle = 0u32;
        loop {
            let finished = done.load(std::sync::atomic::Ordering::Acquire);
            match self.try_dequeue_all_into(target) {
                // this drain began after `done` was seen: nothing can follow it
                Ok(n) if finished => {
                    total += n;
                    break;
                }
                Ok(0) | Err(Contended) => idle = backoff(idle),
                Ok(n) => {
                    total += n;
                    idle = 0;
                }
            }
        }
        total
    }

    /// Copy of the slot array, taken under the lock. Unoccupied slots are
    /// `None`.
    ///
    /// Always makes a bounded attempt, whatever the queue's policy, so it
    /// cannot hang on a lock held by the calling thread (e.g. a live
    /// [`Drain`]; use [`Drain::snapshot`] there).
    pub fn snapshot(&self) -> Result<Vec<Option<T>>, Contended>
    where
        T: Clone,
    {
        let _guard = self
            .lock
            .acquire(LockTag::Snapshot, ContentionPolicy::bounded())
            .ok_or(Contended)?;
        Ok(self.read_snapshot())
    }

    /// Caller must hold the lock.
    fn read_snapshot(&self) -> Vec<Option<T>>
    where
        T: Clone,
    {
        // SAFETY: the lock is held, so no thread is mutating the store.
        self.store.with(|store| unsafe { &*store }.snapshot())
    }

    /// Item count as of the last completed operation. Never takes the lock.
    pub fn snapshot_len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Maximum number of items held at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Contention policy applied to enqueue, dequeue and drains.
    pub fn policy(&self) -> ContentionPolicy {
        self.policy
    }

    /// Which operation currently holds the lock. Diagnostic and racy.
    pub fn holder(&self) -> Option<LockTag> {
        self.lock.holder()
    }

    /// Unwrap into the underlying store.
    pub fn into_inner(self) -> RingStore<T> {
        self.store.into_inner()
    }

    #[inline]
    fn acquire(&self, tag: LockTag) -> Option<LockGuard<'_>> {
        let guard = self.lock.acquire(tag, self.policy);
        if guard.is_none() {
            trace!(?tag, "gave up on contended lock");
        }
        guard
    }
}

impl<T: Clone> ConcurrentQueue<T> {
    /// Build a queue over a deep copy of `store`.
    ///
    /// Later changes to `store` are invisible to the queue and vice versa.
    pub fn new(store: &RingStore<T>) -> Self {
        Self::from(store.clone())
    }
}

impl<T> From<RingStore<T>> for ConcurrentQueue<T> {
    fn from(store: RingStore<T>) -> Self {
        Self::with_policy(store, ContentionPolicy::default())
    }
}

impl<T> fmt::Debug for ConcurrentQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.snapshot_len())
            .field("holder", &self.holder())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Copies the store's count into the length mirror on drop, unwinding
/// included. Must be dropped before the lock guard.
struct PublishLen<'a, T>(&'a ConcurrentQueue<T>);

impl<T> Drop for PublishLen<'_, T> {
    fn drop(&mut self) {
        // SAFETY: created after the guard, so dropped while it is still held.
        let len = self.0.store.with(|store| unsafe { &*store }.len());
        self.0.len.store(len, Ordering::Relaxed);
    }
}

/// Lazy drain returned by [`ConcurrentQueue::try_dequeue_all`].
///
/// Holds the queue lock while alive and not yet exhausted.
pub struct Drain<'a, T> {
    queue: &'a ConcurrentQueue<T>,
    guard: Option<LockGuard<'a>>,
    drained: usize,
}

impl<T> Drain<'_, T> {
    /// Items yielded so far.
    pub fn drained(&self) -> usize {
        self.drained
    }

    /// Copy of the slot array, read through the lock this drain holds.
    ///
    /// Empty once the drain is exhausted and the lock has been released.
    pub fn snapshot(&self) -> Vec<Option<T>>
    where
        T: Clone,
    {
        if self.guard.is_none() {
            return Vec::new();
        }
        self.queue.read_snapshot()
    }
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.guard.as_ref()?;
        let queue = self.queue;
        let item = queue.store.with_mut(|store| {
            // SAFETY: `guard` is held, so access to the store is exclusive.
            let store = unsafe { &mut *store };
            let item = store.dequeue();
            queue.len.store(store.len(), Ordering::Relaxed);
            item
        });
        match item {
            Some(item) => {
                self.drained += 1;
                Some(item)
            }
            None => {
                trace!(drained = self.drained, "lazy drain exhausted");
                self.guard = None;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.guard.is_none() {
            return (0, Some(0));
        }
        // SAFETY: `guard` is held.
        let remaining = self.queue.store.with(|store| unsafe { &*store }.len());
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}
impl<T> FusedIterator for Drain<'_, T> {}

impl<T> fmt::Debug for Drain<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drain")
            .field("locked", &self.guard.is_some())
            .field("drained", &self.drained)
            .finish()
    }
}
