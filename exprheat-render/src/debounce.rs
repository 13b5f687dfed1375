use std::time::{Duration, Instant};

/// Quiet period before a range change is reported to the host
pub const RANGE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Trailing-edge debouncer with caller-supplied time.
///
/// Every `push` restarts the quiet period; `poll` hands back the latest value
/// once the period has elapsed with no further pushes.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Instant at which the pending value becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.delay)
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(due) if now >= due => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Take the pending value regardless of the deadline
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(RANGE_DEBOUNCE)
    }
}
