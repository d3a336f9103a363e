use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Timestamp layout embedded in generated business keys.
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%.6f";

/// Monotonic clock for business-key timestamps.
///
/// Wall-clock microseconds are used when they advance; otherwise the clock
/// steps one microsecond past the last value it handed out. Two keys built
/// from the same components in the same process therefore never collide.
#[derive(Debug, Default)]
pub struct KeyClock {
    last_micros: AtomicI64,
}

impl KeyClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp, strictly greater than any previously returned.
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut last = self.last_micros.load(Ordering::Relaxed);
        loop {
            let next = if wall > last { wall } else { last + 1 };
            match self.last_micros.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now),
                Err(observed) => last = observed,
            }
        }
    }

    /// Next timestamp rendered with [`KEY_TIMESTAMP_FORMAT`].
    pub fn stamp(&self) -> String {
        self.now().format(KEY_TIMESTAMP_FORMAT).to_string()
    }

    /// Join `parts` with `:` and append a fresh timestamp.
    ///
    /// `key(&["u1", "p1"])` yields `u1:p1:20260101120000.000001`.
    pub fn key(&self, parts: &[&str]) -> String {
        let mut key = parts.join(":");
        if !key.is_empty() {
            key.push(':');
        }
        key.push_str(&self.stamp());
        key
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn clock_is_strictly_monotonic() {
        let clock = KeyClock::new();
        let mut prev = clock.now();
        for _ in 0..1_000 {
            let next = clock.now();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn clock_is_monotonic_across_threads() {
        let clock = KeyClock::new();
        let per_thread: Vec<Vec<DateTime<Utc>>> = thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| (0..500).map(|_| clock.now()).collect::<Vec<_>>()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        for stamps in &per_thread {
            assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        }
        let distinct: HashSet<DateTime<Utc>> = per_thread.iter().flatten().copied().collect();
        assert_eq!(distinct.len(), 8 * 500);
    }

    #[test]
    fn keys_do_not_collide() {
        let clock = KeyClock::new();
        let keys: HashSet<String> = (0..500).map(|_| clock.key(&["u1", "p1"])).collect();
        assert_eq!(keys.len(), 500);
    }

    #[test]
    fn key_layout() {
        let clock = KeyClock::new();
        let key = clock.key(&["u1", "order"]);
        let parts: Vec<&str> = key.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "u1");
        assert_eq!(parts[1], "order");
        // yyyymmddHHMMSS.ffffff
        assert_eq!(parts[2].len(), 21);
    }

    #[test]
    fn key_without_parts_is_only_timestamp() {
        let clock = KeyClock::new();
        assert!(!clock.key(&[]).contains(':'));
    }

    proptest! {
        #[test]
        fn keys_sort_in_issue_order(
            parts in prop::collection::vec("[a-z0-9]{1,6}", 0..4),
            n in 2usize..64,
        ) {
            let clock = KeyClock::new();
            let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
            let keys: Vec<String> = (0..n).map(|_| clock.key(&parts)).collect();
            let mut sorted = keys.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted, keys);
        }
    }
}
