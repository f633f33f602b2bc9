//! Back-off schedule for the terminal chat client's reconnects.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    pub initial_delay: Duration,
    /// Cap applied before jitter.
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Consecutive failed attempts tolerated. `0` retries forever.
    pub max_attempts: u32,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: 10,
        }
    }
}

impl ReconnectBackoff {
    /// Delay before retry number `attempt` (0-based), plus up to 25% jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.powi(attempt.min(64) as i32);
        let base = (self.initial_delay.as_secs_f64() * exp).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(base * (1.0 + 0.25 * jitter_fraction(attempt)))
    }

    pub fn should_give_up(&self, attempt: u32) -> bool {
        self.max_attempts != 0 && attempt >= self.max_attempts
    }
}

/// Deterministic spread in `[0, 1)` derived from the attempt number.
fn jitter_fraction(attempt: u32) -> f64 {
    let h = attempt.wrapping_add(1).wrapping_mul(0x9E37_79B1);
    f64::from(h) / (f64::from(u32::MAX) + 1.0)
}
