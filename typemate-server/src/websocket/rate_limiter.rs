use std::time::{Duration, Instant};

/// Token bucket applied to each connection's inbound messages.
///
/// Racers send one message per word, so the bucket allows bursts well above
/// typing speed while still cutting off a flooding client.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_every: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::new_with_limits(40, Duration::from_millis(100))
    }

    pub fn new_with_limits(max_tokens: u32, refill_every: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_every: refill_every.max(Duration::from_millis(1)),
            last_refill: Instant::now(),
        }
    }

    pub fn check_rate_limit(&mut self) -> bool {
        self.refill_tokens();

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&mut self) {
        let elapsed = self.last_refill.elapsed();
        let earned = (elapsed.as_nanos() / self.refill_every.as_nanos()) as u32;

        if earned > 0 {
            self.tokens = self.tokens.saturating_add(earned).min(self.max_tokens);
            self.last_refill += self.refill_every * earned;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_drains_and_blocks() {
        let mut limiter = RateLimiter::new_with_limits(3, Duration::from_secs(60));

        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(!limiter.check_rate_limit());
        assert!(!limiter.check_rate_limit());
    }

    #[test]
    fn test_bucket_refills_over_time() {
        let mut limiter = RateLimiter::new_with_limits(2, Duration::from_millis(100));

        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(!limiter.check_rate_limit());

        std::thread::sleep(Duration::from_millis(250));
        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        // Refills never exceed the bucket size
        assert!(!limiter.check_rate_limit());
    }

    #[test]
    fn test_default_allows_a_fast_typist() {
        let mut limiter = RateLimiter::new();
        for _ in 0..40 {
            assert!(limiter.check_rate_limit());
        }
    }
}
