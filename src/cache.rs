use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::Value;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory response cache keyed by endpoint key. One entry per key; a new
/// insert overwrites the old entry and resets its expiry. Expired entries
/// stay in the map until a sweep or an overwrite removes them, but are never
/// served.
#[derive(Clone, Default)]
pub struct ResponseCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key` if its expiry has not passed.
    pub fn get_live(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock().expect("response cache lock poisoned");
        let entry = entries.get(key)?;
        if entry.is_live(Instant::now()) {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Stores `value` under `key`, expiring `ttl` from now. A zero `ttl`
    /// produces an entry that is already expired, so every lookup misses.
    pub fn insert(&self, key: &str, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut entries = self.entries.lock().expect("response cache lock poisoned");
        entries.insert(key.to_string(), entry);
    }

    /// Drops every entry whose expiry has passed. Returns how many were
    /// removed. Live entries are untouched.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("response cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Drops all entries, live or not. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock().expect("response cache lock poisoned");
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Drops entries whose key contains `pattern`, leaving the rest alone.
    /// Returns how many were removed.
    pub fn clear_matching(&self, pattern: &str) -> usize {
        let mut entries = self.entries.lock().expect("response cache lock poisoned");
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("response cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stops the sweep thread when dropped or via [`SweepHandle::stop`].
pub struct SweepHandle {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SweepHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawns the periodic expiry sweep over `cache`. Housekeeping only: the
/// request path never depends on it. The thread ticks well below `interval`
/// so stopping stays responsive.
pub fn spawn_sweeper(cache: ResponseCache, interval: Duration, log_tx: Sender<String>) -> SweepHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let tick = (interval / 10).clamp(Duration::from_millis(10), Duration::from_secs(1));
    let handle = thread::spawn(move || {
        let mut last_sweep = Instant::now();
        loop {
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep(tick);
            if last_sweep.elapsed() < interval {
                continue;
            }
            let removed = cache.purge_expired();
            if removed > 0 {
                let _ = log_tx.send(format!("[INFO] cache sweep removed {removed} expired entries"));
            }
            last_sweep = Instant::now();
        }
    });
    SweepHandle {
        stop,
        handle: Some(handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::mpsc;

    #[test]
    fn live_entry_is_served_until_expiry() {
        let cache = ResponseCache::new();
        cache.insert("fixtures?live=all", json!({"response": [1]}), Duration::from_secs(60));
        assert_eq!(
            cache.get_live("fixtures?live=all"),
            Some(json!({"response": [1]}))
        );
    }

    #[test]
    fn zero_ttl_entry_misses_immediately() {
        let cache = ResponseCache::new();
        cache.insert("fixtures?date=2026-06-11", json!({"response": []}), Duration::ZERO);
        thread::sleep(Duration::from_millis(2));
        assert!(cache.get_live("fixtures?date=2026-06-11").is_none());
        // Still occupies a slot until a sweep runs.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn insert_overwrites_and_resets_expiry() {
        let cache = ResponseCache::new();
        cache.insert("standings?league=39&season=2025", json!(1), Duration::ZERO);
        cache.insert("standings?league=39&season=2025", json!(2), Duration::from_secs(60));
        assert_eq!(cache.get_live("standings?league=39&season=2025"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn purge_removes_only_expired_entries() {
        let cache = ResponseCache::new();
        cache.insert("a", json!(1), Duration::ZERO);
        cache.insert("b", json!(2), Duration::from_secs(60));
        thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_live("b"), Some(json!(2)));
    }

    #[test]
    fn clear_matching_leaves_other_keys_untouched() {
        let cache = ResponseCache::new();
        cache.insert("fixtures?live=all", json!(1), Duration::from_secs(60));
        cache.insert("fixtures?date=2026-06-11", json!(2), Duration::from_secs(60));
        cache.insert("standings?league=39&season=2025", json!(3), Duration::from_secs(60));
        assert_eq!(cache.clear_matching("fixtures"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_live("standings?league=39&season=2025").is_some());
    }

    #[test]
    fn clear_drops_everything() {
        let cache = ResponseCache::new();
        cache.insert("a", json!(1), Duration::from_secs(60));
        cache.insert("b", json!(2), Duration::from_secs(60));
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn sweeper_thread_removes_expired_entries() {
        let cache = ResponseCache::new();
        cache.insert("a", json!(1), Duration::from_millis(5));
        cache.insert("b", json!(2), Duration::from_secs(60));
        let (log_tx, _log_rx) = mpsc::channel();
        let sweeper = spawn_sweeper(cache.clone(), Duration::from_millis(30), log_tx);
        thread::sleep(Duration::from_millis(150));
        sweeper.stop();
        assert_eq!(cache.len(), 1);
        assert!(cache.get_live("b").is_some());
    }
}
