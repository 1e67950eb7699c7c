use std::thread;
use std::time::Duration;

use crate::config::Timeouts;

/// Spends a phase budget as a fixed number of pump attempts.
///
/// The first attempt runs immediately; every later one sleeps for the poll
/// interval first. Once the attempts are used up the phase has timed out.
#[derive(Debug)]
pub struct Poller {
    attempts_left: u32,
    interval: Duration,
    started: bool,
}

impl Poller {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts_left: attempts.max(1),
            interval,
            started: false,
        }
    }

    pub fn for_budget(timeouts: &Timeouts, budget: Duration) -> Self {
        Self::new(timeouts.attempts(budget), timeouts.poll_interval())
    }

    /// Returns `false` once the budget is exhausted.
    pub fn attempt(&mut self) -> bool {
        if self.attempts_left == 0 {
            return false;
        }
        if self.started {
            thread::sleep(self.interval);
        }
        self.started = true;
        self.attempts_left -= 1;
        true
    }

    pub fn attempts_left(&self) -> u32 {
        self.attempts_left
    }
}
