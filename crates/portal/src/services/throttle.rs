//! Minimum interval between repeated fetches of the same resource.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Remembers when each key was last fetched.
///
/// Keys are free-form; the services use `"{resource}:{donor}"`.
#[derive(Debug)]
pub struct FetchThrottle {
    min_interval: Duration,
    last_fetch: Mutex<HashMap<String, Instant>>,
}

impl FetchThrottle {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_fetch: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `key` may be fetched now. Records the attempt when it may.
    pub fn should_fetch(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// [`Self::should_fetch`] against an explicit clock.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut last_fetch = self
            .last_fetch
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // Drop stale entries so the map does not grow with every donor seen
        if last_fetch.len() > 1024 {
            let min_interval = self.min_interval;
            last_fetch.retain(|_, at| now.saturating_duration_since(*at) < min_interval);
        }

        match last_fetch.get(key) {
            Some(at) if now.saturating_duration_since(*at) < self.min_interval => false,
            _ => {
                last_fetch.insert(key.to_string(), now);
                true
            }
        }
    }

    /// Forget `key`, so the next fetch goes through.
    pub fn reset(&self, key: &str) {
        self.last_fetch
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_fetch_within_interval_is_throttled() {
        let throttle = FetchThrottle::new(Duration::from_secs(2));
        let start = Instant::now();
        assert!(throttle.check_at("profile:1", start));
        assert!(!throttle.check_at("profile:1", start + Duration::from_millis(500)));
        assert!(throttle.check_at("profile:1", start + Duration::from_secs(3)));
    }

    #[test]
    fn test_keys_are_independent() {
        let throttle = FetchThrottle::new(Duration::from_secs(2));
        let now = Instant::now();
        assert!(throttle.check_at("profile:1", now));
        assert!(throttle.check_at("profile:2", now));
        assert!(throttle.check_at("letters:1", now));
    }

    #[test]
    fn test_reset_allows_immediate_fetch() {
        let throttle = FetchThrottle::new(Duration::from_secs(60));
        assert!(throttle.should_fetch("donations:1"));
        assert!(!throttle.should_fetch("donations:1"));
        throttle.reset("donations:1");
        assert!(throttle.should_fetch("donations:1"));
    }

    #[test]
    fn test_zero_interval_never_throttles() {
        let throttle = FetchThrottle::new(Duration::ZERO);
        assert!(throttle.should_fetch("k"));
        assert!(throttle.should_fetch("k"));
    }
}
