use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Injected clock so cache expiry is deterministic in tests.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Catalogue documents stay fresh for five minutes.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// A single-slot cache holding one serialized `{"data": …, "timestamp": …}`
/// blob, valid for a TTL window from its timestamp. Corrupt or stale
/// content reads as a miss, never an error. Optionally persisted to a
/// file so a restart does not refetch a warm catalogue.
pub struct TtlCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: Mutex<Option<String>>,
    path: Option<PathBuf>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        TtlCache { ttl, clock, entry: Mutex::new(None), path: None }
    }

    /// Back the cache with a file, loading whatever is already there.
    /// Unreadable content is ignored; it will read as a miss.
    pub fn with_file(mut self, path: PathBuf) -> Self {
        let existing = std::fs::read_to_string(&path).ok();
        self.path = Some(path);
        *self.entry.lock().unwrap() = existing;
        self
    }

    /// Return the cached payload when present and inside the TTL window.
    pub fn get(&self) -> Option<Value> {
        let entry = self.entry.lock().unwrap();
        let raw = entry.as_ref()?;
        let parsed: Value = serde_json::from_str(raw).ok()?;
        let stamp = parsed.get("timestamp")?.as_i64()?;
        let age = self.clock.now_millis().saturating_sub(stamp);
        if age < 0 || age as u128 > self.ttl.as_millis() {
            return None;
        }
        parsed.get("data").cloned()
    }

    pub fn put(&self, data: &Value) {
        let wrapped = serde_json::json!({
            "data": data,
            "timestamp": self.clock.now_millis(),
        });
        let raw = wrapped.to_string();
        *self.entry.lock().unwrap() = Some(raw.clone());
        self.persist(&raw);
    }

    pub fn invalidate(&self) {
        *self.entry.lock().unwrap() = None;
        if let Some(path) = &self.path {
            let _ = std::fs::remove_file(path);
        }
    }

    // Atomic replace: write to a temp file in the same directory, then
    // rename over the target.
    fn persist(&self, raw: &str) {
        let Some(path) = &self.path else { return };
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let result = tempfile::NamedTempFile::new_in(dir).and_then(|mut tmp| {
            tmp.write_all(raw.as_bytes())?;
            tmp.persist(path).map_err(|e| e.error)?;
            Ok(())
        });
        if let Err(e) = result {
            tracing::warn!(%e, path = %path.display(), "Failed to persist catalogue cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct FakeClock(AtomicI64);

    impl Clock for FakeClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::Relaxed)
        }
    }

    fn cache_with_fake_clock() -> (TtlCache, Arc<FakeClock>) {
        let clock = Arc::new(FakeClock(AtomicI64::new(1_000_000)));
        let cache = TtlCache::with_clock(CACHE_TTL, clock.clone());
        (cache, clock)
    }

    #[test]
    fn hit_inside_window() {
        let (cache, clock) = cache_with_fake_clock();
        cache.put(&serde_json::json!({"vps": 3}));
        clock.0.store(1_000_000 + 4 * 60 * 1000, Ordering::Relaxed);
        assert_eq!(cache.get(), Some(serde_json::json!({"vps": 3})));
    }

    #[test]
    fn miss_after_window() {
        let (cache, clock) = cache_with_fake_clock();
        cache.put(&serde_json::json!([1, 2]));
        clock.0.store(1_000_000 + 6 * 60 * 1000, Ordering::Relaxed);
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let (cache, _clock) = cache_with_fake_clock();
        *cache.entry.lock().unwrap() = Some("{not json".into());
        assert_eq!(cache.get(), None);
        *cache.entry.lock().unwrap() = Some("{\"data\": 1}".into());
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn invalidate_clears_entry() {
        let (cache, _clock) = cache_with_fake_clock();
        cache.put(&serde_json::json!("x"));
        cache.invalidate();
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn file_backed_cache_survives_reconstruction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogue-cache.json");
        let clock = Arc::new(FakeClock(AtomicI64::new(42)));
        let cache = TtlCache::with_clock(CACHE_TTL, clock.clone()).with_file(path.clone());
        cache.put(&serde_json::json!({"gpu": 1}));

        let reopened = TtlCache::with_clock(CACHE_TTL, clock).with_file(path);
        assert_eq!(reopened.get(), Some(serde_json::json!({"gpu": 1})));
    }
}
