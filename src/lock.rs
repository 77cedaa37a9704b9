//! Exchange-based spin lock guarding a [`RingStore`].
//!
//! The flag is `0` when free. A holder installs a nonzero [`LockTag`] with a
//! compare-exchange against `0`, so waiters never overwrite the tag, and
//! releases with a plain store of `0`. All tags exclude each other.
//!
//! [`RingStore`]: crate::RingStore

use crate::sync::{spin_loop, yield_now, AtomicU8, Ordering};

const UNLOCKED: u8 = 0;

/// Busy-spin iterations before [`backoff`] starts yielding to the scheduler.
pub const SPIN_LIMIT: u32 = 64;

/// Which operation holds the lock. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LockTag {
    /// `try_enqueue`.
    Enqueue = 1,
    /// `try_dequeue`.
    Dequeue = 2,
    /// Lazy drain or drain-into.
    Drain = 3,
    /// Slot array copy.
    Snapshot = 4,
}

impl LockTag {
    fn from_raw(raw: u8) -> Option<LockTag> {
        match raw {
            1 => Some(LockTag::Enqueue),
            2 => Some(LockTag::Dequeue),
            3 => Some(LockTag::Drain),
            4 => Some(LockTag::Snapshot),
            _ => None,
        }
    }
}

/// What a thread does when the lock is already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentionPolicy {
    /// Spin (yielding after [`SPIN_LIMIT`] tries) until acquired. Never fails.
    #[default]
    Spin,
    /// Spin `spins` times, then yield up to `yields` times, then give up.
    Bounded {
        /// Busy-spin attempts after the first try.
        spins: u32,
        /// Scheduler yields after spinning, each followed by one attempt.
        yields: u32,
    },
}

impl ContentionPolicy {
    /// Bounded policy with a handful of spins and yields.
    pub const fn bounded() -> Self {
        ContentionPolicy::Bounded { spins: 5, yields: 5 }
    }
}

/// A single-flag spin lock.
pub struct SpinLock {
    flag: AtomicU8,
}

impl SpinLock {
    /// Unlocked flag.
    pub fn new() -> Self {
        SpinLock { flag: AtomicU8::new(UNLOCKED) }
    }

    #[inline(always)]
    fn try_acquire(&self, tag: LockTag) -> bool {
        // test before the CAS so waiters spin on a shared cache line
        self.flag.load(Ordering::Relaxed) == UNLOCKED
            && self
                .flag
                .compare_exchange(UNLOCKED, tag as u8, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
    }

    /// Spin until acquired.
    pub fn lock(&self, tag: LockTag) -> LockGuard<'_> {
        let mut spin = 0u32;
        while !self.try_acquire(tag) {
            spin = backoff(spin);
        }
        LockGuard { lock: self }
    }

    /// Acquire according to `policy`; `None` if a bounded policy ran out.
    pub fn acquire(&self, tag: LockTag, policy: ContentionPolicy) -> Option<LockGuard<'_>> {
        let (spins, yields) = match policy {
            ContentionPolicy::Spin => return Some(self.lock(tag)),
            ContentionPolicy::Bounded { spins, yields } => (spins, yields),
        };

        for _ in 0..=spins {
            if self.try_acquire(tag) {
                return Some(LockGuard { lock: self });
            }
            spin_loop();
        }
        for _ in 0..yields {
            yield_now();
            if self.try_acquire(tag) {
                return Some(LockGuard { lock: self });
            }
        }
        None
    }

    /// Tag of the current holder, if any. Racy.
    pub fn holder(&self) -> Option<LockTag> {
        LockTag::from_raw(self.flag.load(Ordering::Relaxed))
    }

    /// Whether any tag holds the flag. Racy.
    pub fn is_locked(&self) -> bool {
        self.flag.load(Ordering::Relaxed) != UNLOCKED
    }

    #[inline(always)]
    fn release(&self) {
        self.flag.store(UNLOCKED, Ordering::Release);
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the lock until dropped, including during unwinding.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    lock: &'a SpinLock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// Spin a bit then yield.
#[inline(always)]
pub(crate) fn backoff(mut spin: u32) -> u32 {
    if spin < SPIN_LIMIT {
        spin += 1;
        spin_loop();
    } else {
        yield_now();
    }
    spin
}
