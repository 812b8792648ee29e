//! Enforcement Fallback: out-of-band activation with a minimum interval.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::{app::AppHandle, error::FallbackError};

/// Secondary mechanism that asks the platform shell to bring an
/// application's first window to the front.
pub trait Fallback: Send + Sync {
    /// Activate `app` and move its first window to the front.
    fn force_activate(&self, app: &AppHandle) -> Result<(), FallbackError>;
}

/// Allows one event per `interval`, tracked by the last accepted timestamp.
#[derive(Debug, Clone)]
pub struct Throttle {
    /// Minimum spacing between accepted events.
    interval: Duration,
    /// Time of the last accepted event.
    last: Option<Instant>,
}

impl Throttle {
    /// Create a throttle that has never fired.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Accept the event at `now` unless one was accepted within the interval.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last
            && now.saturating_duration_since(last) < self.interval
        {
            return false;
        }
        self.last = Some(now);
        true
    }
}

/// What happened when the fallback was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// Suppressed by the throttle; nothing was invoked.
    Throttled,
    /// The automation call ran and succeeded.
    Activated,
    /// The automation call ran and failed.
    Failed(FallbackError),
}

/// A [`Fallback`] guarded by a [`Throttle`].
pub struct ThrottledFallback {
    /// Underlying automation capability.
    inner: Arc<dyn Fallback>,
    /// Rate limiter shared by all call sites.
    throttle: Throttle,
}

impl ThrottledFallback {
    /// Wrap `inner` with a minimum spacing of `interval`.
    pub fn new(inner: Arc<dyn Fallback>, interval: Duration) -> Self {
        Self {
            inner,
            throttle: Throttle::new(interval),
        }
    }

    /// Invoke the fallback for `app` unless throttled.
    ///
    /// The timestamp is recorded before the call so a failing automation host
    /// is retried no more often than a succeeding one.
    pub fn invoke(&mut self, app: &AppHandle, now: Instant) -> FallbackOutcome {
        if !self.throttle.try_acquire(now) {
            return FallbackOutcome::Throttled;
        }
        match self.inner.force_activate(app) {
            Ok(()) => {
                debug!(app = %app.name, "fallback activation ran");
                FallbackOutcome::Activated
            }
            Err(err) => {
                warn!(app = %app.name, error = %err, "fallback activation failed");
                FallbackOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockFallback, handle};

    #[test]
    fn throttle_spacing() {
        let mut t = Throttle::new(Duration::from_secs(1));
        let t0 = Instant::now();
        assert!(t.try_acquire(t0));
        assert!(!t.try_acquire(t0 + Duration::from_millis(999)));
        assert!(t.try_acquire(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn two_calls_within_interval_invoke_once() {
        let mock = Arc::new(MockFallback::new());
        let mut fb = ThrottledFallback::new(mock.clone(), Duration::from_secs(1));
        let app = handle(7, "Notes", Some("com.apple.Notes"));
        let t0 = Instant::now();

        assert_eq!(fb.invoke(&app, t0), FallbackOutcome::Activated);
        assert_eq!(
            fb.invoke(&app, t0 + Duration::from_millis(500)),
            FallbackOutcome::Throttled
        );
        assert_eq!(mock.calls(), vec!["Notes".to_string()]);
    }

    #[test]
    fn failures_are_reported_and_still_throttled() {
        let mock = Arc::new(MockFallback::new());
        mock.set_fail(true);
        let mut fb = ThrottledFallback::new(mock.clone(), Duration::from_secs(1));
        let app = handle(7, "Notes", None);
        let t0 = Instant::now();

        assert!(matches!(fb.invoke(&app, t0), FallbackOutcome::Failed(_)));
        assert_eq!(
            fb.invoke(&app, t0 + Duration::from_millis(10)),
            FallbackOutcome::Throttled
        );
        assert_eq!(mock.calls().len(), 1);
    }
}
