//! Wall-clock budget for a search.

use crate::error::{CoverError, CoverResult};
use std::time::{Duration, Instant};

/// Single-shot timer with an optional timeout.
///
/// A timeout of zero counts as "no timeout": [`Timer::out_of_time`] never
/// fires for it.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    timeout: Option<Duration>,
    started: Option<Instant>,
}

impl Timer {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout: timeout.filter(|t| !t.is_zero()),
            started: None,
        }
    }

    /// Timer with a millisecond budget, `0` meaning unlimited.
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Some(Duration::from_millis(ms)))
    }

    /// Records the start time. Calling it again resets the baseline.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Time since [`Timer::start`].
    pub fn elapsed(&self) -> CoverResult<Duration> {
        self.started
            .map(|t| t.elapsed())
            .ok_or_else(|| CoverError::invalid_state("timer queried before start"))
    }

    /// Whether the configured timeout has been exceeded.
    pub fn out_of_time(&self) -> bool {
        match (self.timeout, self.elapsed()) {
            (Some(limit), Ok(elapsed)) => elapsed > limit,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_requires_start() {
        let mut timer = Timer::from_millis(10);
        assert!(matches!(timer.elapsed(), Err(CoverError::InvalidState(_))));
        assert!(!timer.out_of_time());
        timer.start();
        assert!(timer.elapsed().is_ok());
    }

    #[test]
    fn zero_timeout_never_expires() {
        let mut timer = Timer::from_millis(0);
        timer.start();
        std::thread::sleep(Duration::from_millis(2));
        assert!(!timer.out_of_time());
        assert_eq!(timer.timeout(), None);
    }

    #[test]
    fn short_timeout_expires() {
        let mut timer = Timer::new(Some(Duration::from_nanos(1)));
        timer.start();
        std::thread::sleep(Duration::from_millis(2));
        assert!(timer.out_of_time());
        timer.start();
        assert!(timer.elapsed().unwrap() < Duration::from_secs(60));
    }
}
