use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error returned by [`BlockingQueue::try_push`] when the queue is full,
/// handing the rejected element back to the caller.
#[derive(Debug, Error)]
#[error("queue is full")]
pub struct Full<T>(pub T);

/// A thread-safe queue protected by a mutex and condition variables.
///
/// The blocking counterpart to the lock-free queues in `ringq`: callers
/// that would rather sleep than poll use this one. Push and pop share the
/// same mutex; waiters are woken on the empty→non-empty and full→non-full
/// transitions.
pub struct BlockingQueue<T> {
    inner: Mutex<VecDeque<T>>,
    /// Maximum number of elements; `usize::MAX` means unbounded.
    max_size: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Creates an unbounded queue.
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// Creates a queue holding at most `max_size` elements; a full queue
    /// blocks [`push`](Self::push) and rejects
    /// [`try_push`](Self::try_push).
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            max_size,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// A panicking consumer callback must not wedge every other thread on
    /// a poisoned lock; the queue contents are plain data and stay valid.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True if the queue currently holds no elements. May block briefly on
    /// the shared lock.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Current number of elements. May block briefly on the shared lock.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Inserts an element, blocking while the queue is full.
    pub fn push(&self, elem: T) {
        let mut queue = self.lock();
        while queue.len() >= self.max_size {
            queue = self
                .not_full
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let was_empty = queue.is_empty();
        queue.push_back(elem);
        drop(queue);

        if was_empty {
            self.not_empty.notify_all();
        }
    }

    /// Inserts an element without blocking; a full queue hands the element
    /// back as `Err(Full(elem))`.
    pub fn try_push(&self, elem: T) -> Result<(), Full<T>> {
        let mut queue = self.lock();
        if queue.len() >= self.max_size {
            return Err(Full(elem));
        }
        let was_empty = queue.is_empty();
        queue.push_back(elem);
        drop(queue);

        if was_empty {
            self.not_empty.notify_all();
        }
        Ok(())
    }

    /// Extracts the front element, blocking while the queue is empty.
    pub fn pop(&self) -> T {
        let mut queue = self.lock();
        while queue.is_empty() {
            queue = self
                .not_empty
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let was_full = queue.len() >= self.max_size;
        let elem = queue.pop_front().expect("non-empty after wait");
        drop(queue);

        if was_full {
            self.not_full.notify_all();
        }
        elem
    }

    /// Extracts the front element without blocking.
    pub fn try_pop(&self) -> Option<T> {
        let mut queue = self.lock();
        let was_full = queue.len() >= self.max_size;
        let elem = queue.pop_front();
        drop(queue);

        if elem.is_some() && was_full {
            self.not_full.notify_all();
        }
        elem
    }

    /// Extracts the front element, waiting up to `timeout` for one to
    /// arrive. Returns `None` on timeout.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.lock();
        while queue.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, result) = self
                .not_empty
                .wait_timeout(queue, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            queue = guard;
            if result.timed_out() && queue.is_empty() {
                return None;
            }
        }
        let was_full = queue.len() >= self.max_size;
        let elem = queue.pop_front().expect("non-empty after wait");
        drop(queue);

        if was_full {
            self.not_full.notify_all();
        }
        Some(elem)
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
