// src/utils/time.rs
//! Wall-clock timestamps for chunk arrival and stream staleness

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Clock source, swappable in tests
pub trait TimeProvider: Send + Sync {
    fn now_nanos(&self) -> u64;

    /// Time elapsed since `earlier_nanos`, zero if the clock went backwards
    fn elapsed_since(&self, earlier_nanos: u64) -> Duration {
        Duration::from_nanos(self.now_nanos().saturating_sub(earlier_nanos))
    }
}

pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_nanos(&self) -> u64 {
        current_timestamp_nanos()
    }
}

/// Manually driven clock
pub struct MockTimeProvider {
    current_time: AtomicU64,
}

impl MockTimeProvider {
    pub fn new(initial_time_nanos: u64) -> Self {
        Self {
            current_time: AtomicU64::new(initial_time_nanos),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.current_time.fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn set_time(&self, nanos: u64) {
        self.current_time.store(nanos, Ordering::Relaxed);
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_nanos(&self) -> u64 {
        self.current_time.load(Ordering::Relaxed)
    }
}

/// Nanoseconds since the Unix epoch, 0 if the system clock predates it
pub fn current_timestamp_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemTimeProvider;
        let first = clock.now_nanos();
        std::thread::sleep(Duration::from_millis(1));
        assert!(clock.now_nanos() > first);
    }

    #[test]
    fn test_mock_clock() {
        let clock = MockTimeProvider::new(1_000);
        clock.advance(Duration::from_micros(2));
        assert_eq!(clock.now_nanos(), 3_000);
        assert_eq!(clock.elapsed_since(1_000), Duration::from_nanos(2_000));

        clock.set_time(500);
        assert_eq!(clock.elapsed_since(1_000), Duration::ZERO);
    }
}
