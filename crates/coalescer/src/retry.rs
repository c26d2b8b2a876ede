//! Backoff schedule between delivery attempts

use std::time::Duration;

use spool_config::WriterConfig;

/// Exponential backoff: `base * 2^(retry - 1)`, capped at `max`
///
/// Setting `base == max` gives a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Backoff {
    pub const fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Backoff taken from writer settings
    pub fn from_config(config: &WriterConfig) -> Self {
        Self::new(config.retry_base_delay, config.retry_max_delay)
    }

    /// Delay before retry number `retry` (1 = first retry)
    pub fn delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_from_base() {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(10));
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_capped_at_max() {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(backoff.delay(5), Duration::from_secs(1));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_fixed_delay() {
        let backoff = Backoff::new(Duration::from_millis(250), Duration::from_millis(250));
        for retry in 1..6 {
            assert_eq!(backoff.delay(retry), Duration::from_millis(250));
        }
    }

    #[test]
    fn test_from_config() {
        let config = WriterConfig::default();
        let backoff = Backoff::from_config(&config);
        assert_eq!(backoff.base, config.retry_base_delay);
        assert_eq!(backoff.max, config.retry_max_delay);
    }
}
