use thiserror::Error;

/// Construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A constructor argument was rejected, e.g. a zero capacity.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// The lock could not be taken within a bounded [`ContentionPolicy`].
///
/// [`ContentionPolicy`]: crate::ContentionPolicy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue lock is contended")]
pub struct Contended;

/// Returned by [`ConcurrentQueue::try_enqueue`]; hands the item back.
///
/// [`ConcurrentQueue::try_enqueue`]: crate::ConcurrentQueue::try_enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryEnqueueError<T> {
    /// Every slot is occupied.
    #[error("queue is full")]
    Full(T),
    /// Another thread held the lock for longer than the policy allows.
    #[error("queue lock is contended")]
    Contended(T),
}

impl<T> TryEnqueueError<T> {
    /// Recover the rejected item.
    pub fn into_inner(self) -> T {
        match self {
            TryEnqueueError::Full(item) | TryEnqueueError::Contended(item) => item,
        }
    }

    /// `true` when the store, not the lock, refused the item.
    pub fn is_full(&self) -> bool {
        matches!(self, TryEnqueueError::Full(_))
    }
}

/// Returned by [`ConcurrentQueue::try_dequeue`].
///
/// [`ConcurrentQueue::try_dequeue`]: crate::ConcurrentQueue::try_dequeue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryDequeueError {
    /// No item was stored.
    #[error("queue is empty")]
    Empty,
    /// Another thread held the lock for longer than the policy allows.
    #[error("queue lock is contended")]
    Contended,
}

impl From<Contended> for TryDequeueError {
    fn from(_: Contended) -> Self {
        TryDequeueError::Contended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_error_returns_item() {
        assert_eq!(TryEnqueueError::Full("a").into_inner(), "a");
        assert_eq!(TryEnqueueError::Contended(7).into_inner(), 7);
        assert!(TryEnqueueError::Full(()).is_full());
        assert!(!TryEnqueueError::Contended(()).is_full());
    }

    #[test]
    fn messages() {
        assert_eq!(
            QueueError::InvalidArgument("capacity must be greater than 0").to_string(),
            "invalid argument: capacity must be greater than 0"
        );
        assert_eq!(TryDequeueError::Empty.to_string(), "queue is empty");
        assert_eq!(TryDequeueError::from(Contended), TryDequeueError::Contended);
    }
}
