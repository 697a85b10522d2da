//! Poll spacing for the rendezvous await loop.

use rand::Rng;
use std::time::Duration;

use crate::config::{BackoffStrategy, RendezvousConfig};

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Jitter: 0 to 10% of the delay
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Bounded retry budget with a delay before every retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub strategy: BackoffStrategy,
}

impl PollPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        let ms = delay.as_millis() as u64;
        Self {
            max_attempts,
            base_delay_ms: ms,
            max_delay_ms: ms,
            strategy: BackoffStrategy::Fixed,
        }
    }

    /// Delay to wait before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => Duration::from_millis(self.base_delay_ms),
            BackoffStrategy::Exponential => {
                calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms)
            }
        }
    }

    /// Lower bound on the time spent waiting when every retry is used.
    pub fn minimum_total_wait(&self) -> Duration {
        (1..=self.max_attempts).fold(Duration::ZERO, |acc, attempt| {
            let floor = match self.strategy {
                BackoffStrategy::Fixed => self.base_delay_ms,
                BackoffStrategy::Exponential => self
                    .base_delay_ms
                    .saturating_mul(2u64.saturating_pow(attempt - 1))
                    .min(self.max_delay_ms),
            };
            acc + Duration::from_millis(floor)
        })
    }
}

impl From<&RendezvousConfig> for PollPolicy {
    fn from(config: &RendezvousConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            strategy: config.strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000);
        assert!(max.as_millis() < 1100);
    }

    #[test]
    fn test_fixed_policy_is_flat() {
        let policy = PollPolicy::fixed(5, Duration::from_millis(10));
        for attempt in 1..=5 {
            assert_eq!(policy.delay_for(attempt), Duration::from_millis(10));
        }
        assert_eq!(policy.minimum_total_wait(), Duration::from_millis(50));
    }

    #[test]
    fn test_exponential_policy_from_config() {
        let policy = PollPolicy::from(&RendezvousConfig {
            max_attempts: 4,
            base_delay_ms: 10,
            max_delay_ms: 30,
            strategy: BackoffStrategy::Exponential,
        });
        assert!(policy.delay_for(2) >= Duration::from_millis(20));
        assert!(policy.delay_for(4) >= Duration::from_millis(30));
        // 10 + 20 + 30 + 30
        assert_eq!(policy.minimum_total_wait(), Duration::from_millis(90));
    }
}
