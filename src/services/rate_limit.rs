use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Fixed-window request limiter keyed by caller identifier. Entries expire
/// with their window; stale keys are dropped lazily on the next check.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    hits: Mutex<HashMap<String, (u32, Instant)>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> RateLimiter {
        RateLimiter {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, identifier: &str) -> bool {
        let now = Instant::now();
        let mut hits = match self.hits.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        hits.retain(|_, (_, started)| now.duration_since(*started) < self.window);

        let (count, _) = hits
            .entry(identifier.to_owned())
            .or_insert_with(|| (0, now));

        if *count >= self.limit {
            return false;
        }

        *count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("driver-1"));
        assert!(limiter.check("driver-1"));
        assert!(limiter.check("driver-1"));
        assert!(!limiter.check("driver-1"));
    }

    #[test]
    fn identifiers_are_tracked_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("driver-1"));
        assert!(!limiter.check("driver-1"));
        assert!(limiter.check("driver-2"));
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.check("driver-1"));
        assert!(!limiter.check("driver-1"));
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.check("driver-1"));
    }
}
