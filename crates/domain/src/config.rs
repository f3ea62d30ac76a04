//! Order creation tuning.

use std::time::Duration;

/// Retry and timeout policy for order creation.
#[derive(Debug, Clone)]
pub struct OrderingConfig {
    /// Attempts per request, counting the first one. Values below 1 act as 1.
    pub max_attempts: u32,
    /// Bound on each attempt up to (not including) its commit.
    pub attempt_timeout: Duration,
}

impl OrderingConfig {
    pub fn new(max_attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            attempt_timeout,
        }
    }
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(5),
        }
    }
}
