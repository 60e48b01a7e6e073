//! Sliding time windows over request timestamps.
//!
//! An entry is expired once `now - ts > window`; an entry exactly `window`
//! old is still counted. Expired entries are evicted before a new entry is
//! considered.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Timestamps (ms) in non-decreasing order.
#[derive(Debug, Clone, Default)]
pub struct SlidingWindow {
    stamps: VecDeque<u64>,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries older than `window_ms` relative to `now_ms`.
    pub fn evict(&mut self, now_ms: u64, window_ms: u64) {
        while let Some(&oldest) = self.stamps.front() {
            if now_ms.saturating_sub(oldest) > window_ms {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record `now_ms`. A clock that steps backwards is clamped to the last
    /// entry to keep the queue ordered.
    pub fn record(&mut self, now_ms: u64) {
        let ts = match self.stamps.back() {
            Some(&last) if last > now_ms => last,
            _ => now_ms,
        };
        self.stamps.push_back(ts);
    }

    /// Evict, then record `now_ms` unless `limit` entries are already in the
    /// window. Returns whether the entry was admitted.
    pub fn try_admit(&mut self, now_ms: u64, window_ms: u64, limit: usize) -> bool {
        self.evict(now_ms, window_ms);
        if self.stamps.len() >= limit {
            return false;
        }
        self.record(now_ms);
        true
    }

    /// Evict, then record `now_ms` unconditionally. Returns the number of
    /// entries in the window, the new one included.
    pub fn record_and_count(&mut self, now_ms: u64, window_ms: u64) -> usize {
        self.evict(now_ms, window_ms);
        self.record(now_ms);
        self.stamps.len()
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
    }
}

/// One sliding window per key.
#[derive(Debug, Clone)]
pub struct KeyedWindows<K> {
    windows: HashMap<K, SlidingWindow>,
}

impl<K> Default for KeyedWindows<K> {
    fn default() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> KeyedWindows<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_admit(&mut self, key: K, now_ms: u64, window_ms: u64, limit: usize) -> bool {
        self.windows
            .entry(key)
            .or_default()
            .try_admit(now_ms, window_ms, limit)
    }

    pub fn record_and_count(&mut self, key: K, now_ms: u64, window_ms: u64) -> usize {
        self.windows
            .entry(key)
            .or_default()
            .record_and_count(now_ms, window_ms)
    }

    /// Entries currently recorded for `key`, without evicting.
    pub fn count(&self, key: &K) -> usize {
        self.windows.get(key).map_or(0, SlidingWindow::len)
    }

    /// Evict every window and drop keys left empty. Returns the number of
    /// keys removed.
    pub fn purge_expired(&mut self, now_ms: u64, window_ms: u64) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| {
            w.evict(now_ms, window_ms);
            !w.is_empty()
        });
        before - self.windows.len()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn clear(&mut self) {
        self.windows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_then_slide() {
        let mut w = SlidingWindow::new();
        for _ in 0..5 {
            assert!(w.try_admit(1_000_000, 1_000, 5));
        }
        assert!(!w.try_admit(1_000_000, 1_000, 5));
        assert_eq!(w.len(), 5);

        assert!(w.try_admit(1_001_100, 1_000, 5));
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn test_boundary_entry_retained() {
        let mut w = SlidingWindow::new();
        assert!(w.try_admit(1_000_000, 1_000, 1));
        // Exactly one window old: still counted
        assert!(!w.try_admit(1_001_000, 1_000, 1));
        // One ms later: expired
        assert!(w.try_admit(1_001_001, 1_000, 1));
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn test_denied_entry_not_recorded() {
        let mut w = SlidingWindow::new();
        assert!(w.try_admit(0, 1_000, 1));
        assert!(!w.try_admit(10, 1_000, 1));
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn test_record_and_count_keeps_every_attempt() {
        let mut w = SlidingWindow::new();
        assert_eq!(w.record_and_count(0, 1_000), 1);
        assert_eq!(w.record_and_count(10, 1_000), 2);
        assert_eq!(w.record_and_count(1_005, 1_000), 2);
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn test_backwards_clock_keeps_order() {
        let mut w = SlidingWindow::new();
        w.record(2_000);
        w.record(1_500);
        w.evict(3_001, 1_000);
        assert!(w.is_empty());
    }

    #[test]
    fn test_keyed_windows_independent_and_purged() {
        let mut windows: KeyedWindows<&str> = KeyedWindows::new();
        assert!(windows.try_admit("a", 1_000, 1_000, 1));
        assert!(!windows.try_admit("a", 1_000, 1_000, 1));
        assert!(windows.try_admit("b", 1_500, 1_000, 1));
        assert_eq!(windows.len(), 2);

        assert_eq!(windows.purge_expired(2_200, 1_000), 1);
        assert_eq!(windows.count(&"a"), 0);
        assert_eq!(windows.count(&"b"), 1);

        assert_eq!(windows.purge_expired(2_600, 1_000), 1);
        assert!(windows.is_empty());
    }
}
