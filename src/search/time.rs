//! Wall-clock budget of a search.

use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Anything the search can poll to learn whether it should stop.
///
/// Polling is cooperative: the search checks at a coarse granularity, so a
/// single expensive subtree can overrun the deadline by its own cost.
pub trait Deadline {
    /// Returns `true` once the search must stop.
    fn expired(&self) -> bool;
}

/// Monotonic stopwatch with an optional millisecond budget.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    limit: Option<Duration>,
    warned: Cell<bool>,
}

impl Timer {
    /// Starts a timer without a budget: it never expires.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            start: Instant::now(),
            limit: None,
            warned: Cell::new(false),
        }
    }

    /// Starts a timer that expires after `limit`.
    ///
    /// # Errors
    ///
    /// A zero budget is rejected.
    pub fn with_limit(limit: Duration) -> Result<Self> {
        let mut timer = Self::unlimited();
        timer.set_limit(limit)?;
        Ok(timer)
    }

    /// Changes the budget, counting from the last [`Timer::reset`].
    ///
    /// # Errors
    ///
    /// A zero budget is rejected.
    pub fn set_limit(&mut self, limit: Duration) -> Result<()> {
        if limit.is_zero() {
            return Err(Error::ZeroTimeBudget);
        }
        self.limit = Some(limit);
        Ok(())
    }

    /// Restarts the clock.
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }

    /// Time since the last reset.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Budget of the timer, if any.
    #[must_use]
    pub const fn limit(&self) -> Option<Duration> {
        self.limit
    }
}

impl Deadline for Timer {
    fn expired(&self) -> bool {
        let Some(limit) = self.limit else {
            if !self.warned.replace(true) {
                log::warn!("timer queried without a time limit");
            }
            return false;
        };
        let elapsed = self.elapsed();
        let expired = elapsed > limit;
        if expired {
            log::trace!("timer expired after {} ms", elapsed.as_millis());
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn zero_budget() {
        assert!(matches!(
            Timer::with_limit(Duration::ZERO),
            Err(Error::ZeroTimeBudget)
        ));
    }

    #[test]
    fn unlimited_never_expires() {
        let timer = Timer::unlimited();
        assert!(!timer.expired());
        assert!(!timer.expired());
        assert_eq!(timer.limit(), None);
    }

    #[test]
    fn expires() {
        let mut timer = Timer::with_limit(Duration::from_millis(5)).unwrap();
        thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
        assert!(timer.expired());
        timer.reset();
        timer.set_limit(Duration::from_secs(60)).unwrap();
        assert!(!timer.expired());
    }
}
