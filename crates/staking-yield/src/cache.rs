// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Single-slot cache for the last computed yield figures.

use std::{
    collections::HashMap,
    io::Write,
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};

use anyhow::{Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use serde::{Deserialize, Serialize};

use crate::yields::YieldRates;

/// Storage key of the cached yield figures
pub const CACHE_KEY: &str = "apr-calculation-cache";
/// How long a cached entry is served before it is considered stale
pub const CACHE_DURATION: Duration = Duration::from_secs(5 * 60);

/// Cached yield figures, stamped with the time they were stored (milliseconds since the epoch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub data: YieldRates,
    pub burn_rate: f64,
    #[serde(deserialize_with = "crate::yields::overflowed_rate")]
    pub real_yield: f64,
    pub timestamp: u64,
}

/// String key/value storage backing the cache.
pub trait CacheStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn store(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Source of the current time, in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
    }
}

/// In-process [CacheStore].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// [CacheStore] keeping one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.path(key);
        AtomicFile::new(&path, AllowOverwrite)
            .write(|file| file.write_all(value.as_bytes()))
            .with_context(|| format!("failed to write {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        match std::fs::remove_file(&path) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
                Err(err).with_context(|| format!("failed to remove {}", path.display()))
            }
            _ => Ok(()),
        }
    }
}

/// Read-through cache of the last successful yield computation.
///
/// The cache holds a single entry under [CACHE_KEY]. Stale or unreadable entries are purged on
/// read. Writers always overwrite, so the last completed computation wins.
pub struct YieldCache<S = MemoryStore, C = SystemClock> {
    store: S,
    clock: C,
}

impl Default for YieldCache {
    fn default() -> Self {
        Self::new(MemoryStore::default(), SystemClock)
    }
}

impl<S: CacheStore, C: Clock> YieldCache<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The cached entry, if there is one and it is still fresh.
    pub fn get(&self) -> Option<CacheEntry> {
        let raw = match self.store.load(CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("Error reading yield cache: {err:?}");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Discarding unreadable yield cache entry: {err}");
                self.purge();
                return None;
            }
        };

        let age = self.clock.now_millis().saturating_sub(entry.timestamp);
        if u128::from(age) > CACHE_DURATION.as_millis() {
            tracing::debug!("Yield cache entry expired ({age} ms old)");
            self.purge();
            return None;
        }
        Some(entry)
    }

    /// Store fresh figures, replacing whatever was cached.
    pub fn put(&self, data: YieldRates, burn_rate: f64, real_yield: f64) -> Result<CacheEntry> {
        let entry = CacheEntry { data, burn_rate, real_yield, timestamp: self.clock.now_millis() };
        let raw = serde_json::to_string(&entry).context("failed to serialize cache entry")?;
        self.store.store(CACHE_KEY, &raw)?;
        Ok(entry)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(CACHE_KEY)
    }

    fn purge(&self) {
        if let Err(err) = self.store.remove(CACHE_KEY) {
            tracing::warn!("Failed to purge yield cache entry: {err:?}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    };

    /// Clock that only moves when told to.
    #[derive(Clone, Default)]
    pub(crate) struct ManualClock(Arc<AtomicU64>);

    impl ManualClock {
        pub(crate) fn at(millis: u64) -> Self {
            Self(Arc::new(AtomicU64::new(millis)))
        }

        pub(crate) fn advance(&self, by: Duration) {
            self.0.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn rates() -> YieldRates {
        YieldRates { apr: 12.5, apy: 13.3, reward_rate_per_epoch: 0.0003 }
    }

    #[test]
    fn test_empty_cache() {
        let cache = YieldCache::new(MemoryStore::default(), ManualClock::at(0));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_entry_is_fresh_for_five_minutes() {
        let clock = ManualClock::at(1_700_000_000_000);
        let cache = YieldCache::new(MemoryStore::default(), clock.clone());

        let entry = cache.put(rates(), 0.28, 13.58).unwrap();
        assert_eq!(entry.timestamp, 1_700_000_000_000);
        assert_eq!(cache.get(), Some(entry));

        clock.advance(CACHE_DURATION);
        assert_eq!(cache.get(), Some(entry));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get(), None);
        // The stale entry was purged rather than just hidden.
        assert_eq!(cache.store.load(CACHE_KEY).unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let clock = ManualClock::at(0);
        let cache = YieldCache::new(MemoryStore::default(), clock.clone());

        cache.put(rates(), 0.1, 1.0).unwrap();
        clock.advance(Duration::from_secs(60));
        let newer = cache.put(YieldRates { apr: 1.0, ..rates() }, 0.2, 2.0).unwrap();

        assert_eq!(cache.get(), Some(newer));
        assert_eq!(newer.timestamp, 60_000);
    }

    #[test]
    fn test_corrupt_entry_is_purged() {
        let cache = YieldCache::new(MemoryStore::default(), ManualClock::at(0));
        cache.store.store(CACHE_KEY, "{not json").unwrap();

        assert_eq!(cache.get(), None);
        assert_eq!(cache.store.load(CACHE_KEY).unwrap(), None);
    }

    #[test]
    fn test_clear() {
        let cache = YieldCache::new(MemoryStore::default(), ManualClock::at(0));
        cache.put(rates(), 0.1, 1.0).unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = CacheEntry { data: rates(), burn_rate: 0.5, real_yield: 13.8, timestamp: 42 };
        let value = serde_json::to_value(entry).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "data": { "apr": 12.5, "apy": 13.3, "rewardRatePerEpoch": 0.0003 },
                "burnRate": 0.5,
                "realYield": 13.8,
                "timestamp": 42
            })
        );
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::at(5_000);
        let cache = YieldCache::new(FileStore::new(dir.path().join("cache")), clock.clone());

        assert_eq!(cache.get(), None);
        let entry = cache.put(rates(), 0.3, 13.6).unwrap();

        // A second cache over the same directory sees the entry.
        let reopened = YieldCache::new(FileStore::new(dir.path().join("cache")), clock);
        assert_eq!(reopened.get(), Some(entry));

        reopened.clear().unwrap();
        assert_eq!(cache.get(), None);
        // Clearing twice is fine.
        reopened.clear().unwrap();
    }
}
