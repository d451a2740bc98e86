use crate::blocking::{BlockingQueue, Full};
use ringq::{Backend, Backoff, BackoffPolicy, Queue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// How long the consumer thread waits for an item before waking up to
/// check the terminate flag.
const WAKEUP_TIMEOUT: Duration = Duration::from_millis(1);

/// A source the consumer thread can poll with a patience bound.
///
/// Implemented by [`BlockingQueue`] (a condvar timed wait) and by the
/// lock-free `ringq` queues (a backoff-paced poll of `pop`), so the same
/// driver works over either.
pub trait TimedPoll<T> {
    /// Waits up to `patience` for an element; `None` on timeout.
    fn poll_timeout(&self, patience: Duration) -> Option<T>;
}

impl<T> TimedPoll<T> for BlockingQueue<T> {
    fn poll_timeout(&self, patience: Duration) -> Option<T> {
        self.pop_timeout(patience)
    }
}

impl<T, B: Backend<T>> TimedPoll<T> for Queue<T, B> {
    /// The lock-free queues never block, so the timeout is implemented as
    /// a poll loop paced by the adaptive backoff.
    fn poll_timeout(&self, patience: Duration) -> Option<T> {
        let deadline = Instant::now() + patience;
        let mut backoff = Backoff::new(BackoffPolicy::Adaptive);
        loop {
            if let Some(elem) = self.pop() {
                return Some(elem);
            }
            if Instant::now() >= deadline {
                return None;
            }
            backoff.wait();
        }
    }
}

/// A background thread that drains a queue through a per-item callback.
///
/// The thread runs an optional init callback once in its own context, then
/// loops: timed-wait for an item, hand it to the consume callback, and
/// between timeouts check whether it has been told to finish. Dropping the
/// driver (or calling [`join`](Self::join)) sets the terminate flag and
/// waits for the thread to exit.
///
/// By default the driver owns a [`BlockingQueue`] that callers feed
/// through [`produce`](Self::produce)/[`produce_blocking`](Self::produce_blocking);
/// [`over`](Self::over) instead drives any shared [`TimedPoll`] source,
/// such as a `ringq` queue that producers push into directly.
pub struct ConsumerThread<T, S: TimedPoll<T> = BlockingQueue<T>> {
    source: Arc<S>,
    terminate: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Send + 'static> ConsumerThread<T> {
    /// Spawns a consumer thread over an unbounded internal queue.
    pub fn new<F>(consume: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self::over_with_init(Arc::new(BlockingQueue::new()), consume, || {})
    }

    /// Spawns a consumer thread over a bounded internal queue.
    pub fn with_capacity<F>(capacity: usize, consume: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self::over_with_init(Arc::new(BlockingQueue::with_capacity(capacity)), consume, || {})
    }

    /// Spawns a consumer thread over a bounded internal queue, running
    /// `init` once in the thread's context before any item is consumed.
    pub fn with_init<F, I>(capacity: usize, consume: F, init: I) -> Self
    where
        F: FnMut(T) + Send + 'static,
        I: FnOnce() + Send + 'static,
    {
        Self::over_with_init(Arc::new(BlockingQueue::with_capacity(capacity)), consume, init)
    }

    /// Inserts an item for the consumer thread without blocking; a full
    /// queue hands it back as `Err(Full(item))`.
    pub fn produce(&self, item: T) -> Result<(), Full<T>> {
        self.source.try_push(item)
    }

    /// Inserts an item for the consumer thread, blocking until the queue
    /// accepts it.
    pub fn produce_blocking(&self, item: T) {
        self.source.push(item);
    }
}

impl<T, S> ConsumerThread<T, S>
where
    T: Send + 'static,
    S: TimedPoll<T> + Send + Sync + 'static,
{
    /// Spawns a consumer thread draining an external shared source.
    pub fn over<F>(source: Arc<S>, consume: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self::over_with_init(source, consume, || {})
    }

    /// Spawns a consumer thread draining an external shared source, with
    /// an init callback run once in the thread's context.
    pub fn over_with_init<F, I>(source: Arc<S>, mut consume: F, init: I) -> Self
    where
        F: FnMut(T) + Send + 'static,
        I: FnOnce() + Send + 'static,
    {
        let terminate = Arc::new(AtomicBool::new(false));

        let thread_source = Arc::clone(&source);
        let thread_terminate = Arc::clone(&terminate);
        let handle = thread::spawn(move || {
            debug!("consumer thread started");
            init();
            while !thread_terminate.load(Ordering::Acquire) {
                if let Some(item) = thread_source.poll_timeout(WAKEUP_TIMEOUT) {
                    consume(item);
                }
            }
            debug!("consumer thread terminating");
        });

        Self {
            source,
            terminate,
            handle: Some(handle),
            _marker: std::marker::PhantomData,
        }
    }

    /// Tells the consumer thread to finish and waits until it does.
    ///
    /// Items still queued when the flag is observed are not drained; the
    /// thread exits after at most one more wakeup timeout.
    pub fn join(mut self) {
        self.shutdown();
    }
}

impl<T, S: TimedPoll<T>> ConsumerThread<T, S> {
    fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.terminate.store(true, Ordering::Release);
            if handle.join().is_err() {
                debug!("consumer thread exited by panic");
            }
        }
    }
}

impl<T, S: TimedPoll<T>> Drop for ConsumerThread<T, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
