//! In-memory tile store with per-entry expiration.
//!
//! Backed by `moka::future::Cache`, which uses lock-free structures
//! internally: reads and writes on distinct keys proceed concurrently
//! without blocking the Tokio runtime, and expired entries become
//! invisible to reads the moment their TTL elapses. A periodic sweeper
//! task runs moka's pending maintenance so expired entries are also
//! physically removed between requests.
//!
//! The store holds tile bytes exclusively; callers receive cheap
//! read-only [`Bytes`] views.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

use crate::tile::TileKey;

/// Snapshot of store counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// TTL-bounded in-memory cache of tile bytes.
///
/// Entries expire a fixed TTL after insertion; overwriting an entry
/// resets its TTL, reads do not. The store performs no I/O and starts
/// empty - its lifetime is the process lifetime.
pub struct TileStore {
    cache: Cache<TileKey, Bytes>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TileStore {
    /// Creates an empty store whose entries live for `ttl` after insert.
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().time_to_live(ttl).build();
        Self {
            cache,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up a tile. Never fetches remotely, never blocks on I/O.
    pub async fn get(&self, key: &TileKey) -> Option<Bytes> {
        match self.cache.get(key).await {
            Some(bytes) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(bytes)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Inserts or overwrites a tile, resetting its TTL.
    pub async fn put(&self, key: TileKey, data: Bytes) {
        self.cache.insert(key, data).await;
    }

    /// Returns the tile for `key`, running `init` to produce it on a miss.
    ///
    /// Concurrent callers for the same missing key coalesce onto a single
    /// `init` execution; the winner's value is stored and shared, errors
    /// are shared as `Arc<E>` and nothing is stored. The store itself has
    /// no opinion about where the bytes come from.
    pub async fn get_or_try_insert_with<F, E>(
        &self,
        key: TileKey,
        init: F,
    ) -> Result<Bytes, Arc<E>>
    where
        F: Future<Output = Result<Bytes, E>>,
        E: Send + Sync + 'static,
    {
        let entry = self.cache.entry(key).or_try_insert_with(init).await?;
        if entry.is_fresh() {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(entry.into_value())
    }

    /// Whether a live (unexpired) entry exists for `key`.
    ///
    /// Does not count as a read and does not touch hit/miss counters.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Current number of entries, including any not yet swept.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Counter snapshot.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entry_count(),
        }
    }

    /// Removes expired entries now.
    pub async fn sweep(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Spawns the periodic sweep task.
    ///
    /// The task runs independently of request traffic until the returned
    /// handle is dropped or aborted by the owner.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick fires immediately; skip it so the first sweep
            // happens one interval after startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.sweep().await;
                trace!(entries = store.entry_count(), "tile store sweep complete");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::tile::TileStyle;

    fn key(x: u32) -> TileKey {
        TileKey::new(
            TileStyle::Dark,
            TileCoord { x, y: 8443, zoom: 14 },
        )
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = TileStore::new(Duration::from_secs(60));
        let data = Bytes::from_static(b"png bytes");

        store.put(key(1), data.clone()).await;

        assert_eq!(store.get(&key(1)).await, Some(data));
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_get_miss() {
        let store = TileStore::new(Duration::from_secs(60));
        assert_eq!(store.get(&key(1)).await, None);

        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let store = TileStore::new(Duration::from_secs(60));
        store.put(key(1), Bytes::from_static(b"old")).await;
        store.put(key(1), Bytes::from_static(b"new")).await;

        assert_eq!(store.get(&key(1)).await, Some(Bytes::from_static(b"new")));
        store.sweep().await;
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let store = TileStore::new(Duration::from_millis(200));
        store.put(key(1), Bytes::from_static(b"tile")).await;

        // Well inside the TTL window the entry is served.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.get(&key(1)).await.is_some());

        // Past the TTL it is gone, sweep or no sweep.
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(store.get(&key(1)).await.is_none());
        assert!(!store.contains(&key(1)));
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let store = TileStore::new(Duration::from_millis(300));
        store.put(key(1), Bytes::from_static(b"first")).await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        store.put(key(1), Bytes::from_static(b"second")).await;

        // 200ms after the overwrite the original TTL would have lapsed,
        // but the refresh keeps the entry alive.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            store.get(&key(1)).await,
            Some(Bytes::from_static(b"second"))
        );
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let store = Arc::new(TileStore::new(Duration::from_millis(100)));
        store.put(key(1), Bytes::from_static(b"tile")).await;
        store.put(key(2), Bytes::from_static(b"tile")).await;

        let sweeper = store.spawn_sweeper(Duration::from_millis(50));

        // Give the TTL and a few sweep ticks time to pass.
        let mut remaining = store.entry_count();
        for _ in 0..40 {
            if remaining == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            remaining = store.entry_count();
        }
        sweeper.abort();

        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_hit_and_miss_counters() {
        let store = TileStore::new(Duration::from_secs(60));
        store.put(key(1), Bytes::from_static(b"tile")).await;

        store.get(&key(1)).await;
        store.get(&key(1)).await;
        store.get(&key(2)).await;

        let stats = store.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_single_flight_coalesces_concurrent_misses() {
        let store = Arc::new(TileStore::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicU64::new(0));

        let fetch = |calls: Arc<AtomicU64>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, std::io::Error>(Bytes::from_static(b"tile"))
        };

        let (a, b) = tokio::join!(
            store.get_or_try_insert_with(key(1), fetch(Arc::clone(&calls))),
            store.get_or_try_insert_with(key(1), fetch(Arc::clone(&calls))),
        );

        assert_eq!(a.unwrap(), Bytes::from_static(b"tile"));
        assert_eq!(b.unwrap(), Bytes::from_static(b"tile"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_init_stores_nothing() {
        let store = TileStore::new(Duration::from_secs(60));

        let result = store
            .get_or_try_insert_with(key(1), async {
                Err::<Bytes, _>(std::io::Error::other("upstream down"))
            })
            .await;

        assert!(result.is_err());
        assert!(!store.contains(&key(1)));

        // A later successful attempt populates the entry normally.
        let result = store
            .get_or_try_insert_with(key(1), async {
                Ok::<_, std::io::Error>(Bytes::from_static(b"tile"))
            })
            .await;
        assert_eq!(result.unwrap(), Bytes::from_static(b"tile"));
    }

    #[tokio::test]
    async fn test_concurrent_access_across_keys() {
        let store = Arc::new(TileStore::new(Duration::from_secs(60)));
        let mut handles = Vec::new();

        for x in 0..100 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let data = Bytes::from(vec![x as u8; 64]);
                store.put(key(x), data.clone()).await;
                assert_eq!(store.get(&key(x)).await, Some(data));
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        store.sweep().await;
        assert_eq!(store.entry_count(), 100);
    }
}
