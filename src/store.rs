//! Fixed-capacity circular storage with no synchronization of its own.

use core::fmt;
use core::iter::FusedIterator;

use crate::error::QueueError;

/// Array-backed FIFO of fixed capacity.
///
/// Occupied slots are exactly `(head + k) % capacity` for `0 <= k < count`.
/// Every other slot holds `None`, so dequeued values are never retained.
///
/// Not thread-safe on its own; share it through a [`ConcurrentQueue`].
///
/// [`ConcurrentQueue`]: crate::ConcurrentQueue
pub struct RingStore<T> {
    buffer: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> RingStore<T> {
    /// Allocate a store with room for `capacity` items.
    ///
    /// Fails with [`QueueError::InvalidArgument`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidArgument("capacity must be greater than 0"));
        }
        let buffer = (0..capacity).map(|_| None).collect::<Vec<_>>().into_boxed_slice();
        Ok(RingStore { buffer, head: 0, tail: 0, count: 0 })
    }

    /// Append `item` at the tail. Hands it back if every slot is taken.
    pub fn enqueue(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.buffer[self.tail] = Some(item);
        self.tail = self.advance(self.tail);
        self.count += 1;
        Ok(())
    }

    /// Remove the oldest item, clearing its slot.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let item = self.buffer[self.head].take();
        debug_assert!(item.is_some(), "occupied slot {} was empty", self.head);
        self.head = self.advance(self.head);
        self.count -= 1;
        item
    }

    /// Remove every item currently stored, oldest first.
    ///
    /// Items not pulled from the iterator stay in the store.
    pub fn drain(&mut self) -> StoreDrain<'_, T> {
        StoreDrain { store: self }
    }

    #[inline]
    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.buffer.len()
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// No slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Every slot is occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.buffer.len()
    }
}

impl<T: Clone> RingStore<T> {
    /// Copy of the raw slot array in index order (not FIFO order).
    /// Unoccupied slots read as `None`.
    pub fn snapshot(&self) -> Vec<Option<T>> {
        self.buffer.to_vec()
    }
}

/// Deep copy: same capacity, same items in the same slots.
impl<T: Clone> Clone for RingStore<T> {
    fn clone(&self) -> Self {
        RingStore {
            buffer: self.buffer.clone(),
            head: self.head,
            tail: self.tail,
            count: self.count,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RingStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingStore")
            .field("capacity", &self.capacity())
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("count", &self.count)
            .finish()
    }
}

/// Iterator returned by [`RingStore::drain`].
pub struct StoreDrain<'a, T> {
    store: &'a mut RingStore<T>,
}

impl<T> Iterator for StoreDrain<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.store.dequeue()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.store.count, Some(self.store.count))
    }
}

impl<T> ExactSizeIterator for StoreDrain<'_, T> {}
impl<T> FusedIterator for StoreDrain<'_, T> {}
