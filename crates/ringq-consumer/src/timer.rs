use std::ops::Add;
use tracing::trace;

/// A periodic callback timer driven by externally supplied timestamps.
///
/// The timer keeps no clock of its own: callers feed it the current time
/// through [`update`](Self::update), typically from whatever loop already
/// owns the application's notion of time. Generic over the time type, so
/// ticks, milliseconds or any ordered additive value work.
///
/// Not thread-safe by itself; wrap it in a lock if shared across threads.
pub struct VirtualTimer<T, F>
where
    T: Copy + Ord + Add<Output = T>,
    F: FnMut(T),
{
    callback: F,
    period: T,
    /// Deadline of the next expiry; `None` until the first update arms
    /// the timer.
    next_expiry: Option<T>,
}

impl<T, F> VirtualTimer<T, F>
where
    T: Copy + Ord + Add<Output = T>,
    F: FnMut(T),
{
    /// Creates a timer that fires `callback` every `period`, starting one
    /// period after the first [`update`](Self::update).
    pub fn new(period: T, callback: F) -> Self {
        Self {
            callback,
            period,
            next_expiry: None,
        }
    }

    /// Feeds the timer the current time.
    ///
    /// The first call only arms the timer (`now + period`); no callback.
    /// Afterwards, whenever `now` reaches the deadline the callback is
    /// invoked with `now` — from the caller's thread — and the next
    /// deadline becomes `now + period`, so a late update stretches the
    /// following interval rather than firing twice. A timestamp before
    /// the deadline, including time going backwards, never fires.
    pub fn update(&mut self, now: T) {
        match self.next_expiry {
            None => self.next_expiry = Some(now + self.period),
            Some(deadline) if now >= deadline => {
                self.next_expiry = Some(now + self.period);
                trace!("virtual timer expired");
                (self.callback)(now);
            }
            Some(_) => {}
        }
    }
}
