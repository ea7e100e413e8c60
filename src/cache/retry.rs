//! Fixed-delay retry budget for cache writes

use std::time::{Duration, Instant};

/// Total window and inter-attempt delay for contended writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wall-clock budget measured from the first attempt
    pub total: Duration,

    /// Sleep between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_TOTAL: Duration = Duration::from_secs(1);
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(250);

    pub fn new(total: Duration, delay: Duration) -> Self {
        Self { total, delay }
    }

    /// Start counting attempts against this budget
    pub fn start(&self) -> Attempts {
        Attempts {
            policy: *self,
            started: Instant::now(),
            count: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOTAL, Self::DEFAULT_DELAY)
    }
}

/// Attempt counter for one retried operation
///
/// The first attempt is always allowed. After that, another attempt is
/// allowed only if it would start before the total budget runs out.
#[derive(Debug)]
pub struct Attempts {
    policy: RetryPolicy,
    started: Instant,
    count: u32,
}

impl Attempts {
    /// Record the start of an attempt and return its 1-based number
    pub fn begin(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    /// Whether another attempt fits in the budget
    pub fn more(&self) -> bool {
        self.started.elapsed() + self.policy.delay < self.policy.total
    }

    /// Sleep until the next attempt
    pub fn wait(&self) {
        std::thread::sleep(self.policy.delay);
    }

    #[cfg(test)]
    fn count(&self) -> u32 {
        self.count
    }
}
