//! Cooperative periodic timer driven by the host event loop.

use std::time::{Duration, Instant};

/// A repeating deadline that the event loop polls.
///
/// At most one schedule exists per ticker: [`Ticker::start`] replaces any
/// previous schedule, so restarting can never leave two overlapping timers.
#[derive(Debug, Clone)]
pub struct Ticker {
    /// Interval between fires.
    period: Duration,
    /// Next fire time; `None` while stopped.
    next: Option<Instant>,
}

impl Ticker {
    /// Create a stopped ticker.
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    /// (Re)start the schedule; the first fire is one period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.period);
    }

    /// Cancel the schedule.
    pub fn stop(&mut self) {
        self.next = None;
    }

    /// Whether a schedule is active.
    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// Next deadline, if running.
    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns true (and schedules the next fire) when the deadline has passed.
    ///
    /// Missed periods are not replayed: a late poll fires once and the next
    /// deadline is measured from `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next {
            Some(next) if now >= next => {
                self.next = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}
