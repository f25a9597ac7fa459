// Query cache with freshness and retention windows
//
// Entries are keyed by a hierarchical query key and remember when they were last
// fetched and last read. Reads inside the freshness window are served from memory,
// invalidation marks entries stale, and a background task evicts entries that have
// not been read within their retention window. Changes are broadcast to subscribers.
//
// Numan Thabit 2025 Nov

use crate::metrics::CACHE_LOOKUPS;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(30 * 60);

/// Hierarchical identity of a cached query, e.g. `transfers/list`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long fetched data is served without refetching
    pub stale_time: Duration,
    /// How long an entry survives after its last read
    pub gc_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Invalidated(QueryKey),
    Removed(QueryKey),
}

struct CacheEntry {
    data: Option<Arc<dyn Any + Send + Sync>>,
    updated_at: Option<Instant>,
    last_accessed: Instant,
    invalidated: bool,
    // Bumped on every invalidation; a fetch that started under an older
    // generation stores its result as already stale.
    generation: u64,
    // Generation the stored data was fetched under.
    data_generation: Option<u64>,
    // Fetches started and not yet settled; gc never evicts these entries.
    in_flight: usize,
    gc_time: Duration,
}

impl CacheEntry {
    fn pending(now: Instant, gc_time: Duration) -> Self {
        Self {
            data: None,
            updated_at: None,
            last_accessed: now,
            invalidated: false,
            generation: 0,
            data_generation: None,
            in_flight: 0,
            gc_time,
        }
    }

    fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        match self.updated_at {
            Some(updated_at) if self.data.is_some() && !self.invalidated => {
                now.duration_since(updated_at) < stale_time
            }
            _ => false,
        }
    }

    fn value<T: Clone + 'static>(&self) -> Option<T> {
        self.data.as_ref()?.downcast_ref::<T>().cloned()
    }
}

#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, CacheEntry>>>,
    tx: broadcast::Sender<CacheEvent>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(64)
    }
}

impl QueryCache {
    pub fn new(event_buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(event_buffer.max(1));
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.tx.subscribe()
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    /// Serve `key` from cache while fresh, otherwise run `fetcher` and store its result.
    /// Failed fetches leave any previous data in place.
    pub async fn fetch_query<T, E, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let label = key.to_string();
        let started_generation = {
            let mut entries = self.entries.write().await;
            let now = Instant::now();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::pending(now, options.gc_time));
            entry.last_accessed = now;
            entry.gc_time = options.gc_time;
            if entry.is_fresh(now, options.stale_time) {
                if let Some(value) = entry.value::<T>() {
                    CACHE_LOOKUPS.with_label_values(&[&label, "hit"]).inc();
                    debug!(query = %key, "query cache hit");
                    return Ok(value);
                }
            }
            entry.in_flight += 1;
            entry.generation
        };
        let mut in_flight = InFlightGuard {
            entries: Arc::clone(&self.entries),
            key: Some(key.clone()),
        };

        CACHE_LOOKUPS.with_label_values(&[&label, "miss"]).inc();
        debug!(query = %key, "query cache miss; fetching");
        let result = fetcher().await;

        let stored = {
            let mut entries = self.entries.write().await;
            in_flight.disarm();
            let now = Instant::now();
            match entries.get_mut(&key) {
                Some(entry) => {
                    release_in_flight_entry(entry);
                    match &result {
                        Ok(value) => store_result(&key, entry, value, started_generation, now),
                        Err(_) => false,
                    }
                }
                // Removed while fetching: any invalidation since is unknown, so keep it stale.
                None => match &result {
                    Ok(value) => {
                        let mut entry = CacheEntry::pending(now, options.gc_time);
                        entry.data = Some(Arc::new(value.clone()));
                        entry.updated_at = Some(now);
                        entry.invalidated = true;
                        entries.insert(key.clone(), entry);
                        debug!(query = %key, "query removed while fetching; stored as stale");
                        true
                    }
                    Err(_) => false,
                },
            }
        };
        if stored {
            self.emit(CacheEvent::Updated(key));
        }
        result
    }

    /// Warm `key` ahead of use. Failures are logged and swallowed.
    pub async fn prefetch_query<T, E, F, Fut>(&self, key: QueryKey, options: QueryOptions, fetcher: F)
    where
        T: Clone + Send + Sync + 'static,
        E: fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Err(err) = self.fetch_query(key.clone(), options, fetcher).await {
            warn!(query = %key, error = %err, "prefetch failed");
        }
    }

    /// Cached value regardless of staleness.
    pub async fn get_query_data<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.read().await;
        entries.get(key).and_then(|entry| entry.value::<T>())
    }

    pub async fn set_query_data<T: Send + Sync + 'static>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        value: T,
    ) {
        {
            let mut entries = self.entries.write().await;
            let now = Instant::now();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::pending(now, options.gc_time));
            entry.data = Some(Arc::new(value));
            entry.updated_at = Some(now);
            entry.last_accessed = now;
            entry.gc_time = options.gc_time;
            entry.invalidated = false;
            entry.data_generation = Some(entry.generation);
        }
        self.emit(CacheEvent::Updated(key));
    }

    pub async fn is_stale(&self, key: &QueryKey, stale_time: Duration) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .map_or(true, |entry| !entry.is_fresh(Instant::now(), stale_time))
    }

    /// Mark every entry under `prefix` stale. Returns how many entries matched.
    pub async fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let invalidated: Vec<QueryKey> = {
            let mut entries = self.entries.write().await;
            entries
                .iter_mut()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, entry)| {
                    entry.invalidated = true;
                    entry.generation += 1;
                    key.clone()
                })
                .collect()
        };
        debug!(prefix = %prefix, count = invalidated.len(), "invalidated queries");
        let count = invalidated.len();
        for key in invalidated {
            self.emit(CacheEvent::Invalidated(key));
        }
        count
    }

    pub async fn remove(&self, key: &QueryKey) -> bool {
        let removed = self.entries.write().await.remove(key).is_some();
        if removed {
            self.emit(CacheEvent::Removed(key.clone()));
        }
        removed
    }

    /// Evict entries whose last read is older than their retention window.
    pub async fn gc(&self) -> usize {
        let evicted: Vec<QueryKey> = {
            let mut entries = self.entries.write().await;
            let now = Instant::now();
            let expired: Vec<QueryKey> = entries
                .iter()
                .filter(|(_, entry)| {
                    entry.in_flight == 0 && now.duration_since(entry.last_accessed) >= entry.gc_time
                })
                .map(|(key, _)| key.clone())
                .collect();
            for key in &expired {
                entries.remove(key);
            }
            expired
        };
        let count = evicted.len();
        for key in evicted {
            self.emit(CacheEvent::Removed(key));
        }
        count
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Store a fetched value unless data from a newer generation is already there.
/// Returns whether the entry changed.
fn store_result<T>(
    key: &QueryKey,
    entry: &mut CacheEntry,
    value: &T,
    started_generation: u64,
    now: Instant,
) -> bool
where
    T: Clone + Send + Sync + 'static,
{
    if started_generation < entry.generation && entry.data_generation == Some(entry.generation) {
        debug!(query = %key, "older fetch settled after a newer one; result dropped");
        return false;
    }
    entry.data = Some(Arc::new(value.clone()));
    entry.updated_at = Some(now);
    entry.last_accessed = now;
    entry.data_generation = Some(started_generation);
    entry.invalidated = started_generation != entry.generation;
    if entry.invalidated {
        debug!(query = %key, "query invalidated while fetching; stored as stale");
    }
    true
}

/// Releases an entry's in-flight mark when a fetch is dropped before it settles.
struct InFlightGuard {
    entries: Arc<RwLock<HashMap<QueryKey, CacheEntry>>>,
    key: Option<QueryKey>,
}

impl InFlightGuard {
    fn disarm(&mut self) {
        self.key = None;
    }
}

fn release_in_flight_entry(entry: &mut CacheEntry) {
    entry.in_flight = entry.in_flight.saturating_sub(1);
}

fn release_in_flight(entries: &mut HashMap<QueryKey, CacheEntry>, key: &QueryKey) {
    if let Some(entry) = entries.get_mut(key) {
        release_in_flight_entry(entry);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        if let Ok(mut entries) = self.entries.try_write() {
            release_in_flight(&mut entries, &key);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let entries = Arc::clone(&self.entries);
                handle.spawn(async move {
                    release_in_flight(&mut *entries.write().await, &key);
                });
            }
            Err(_) => warn!(query = %key, "cancelled fetch left its entry pinned"),
        }
    }
}

/// Start the cache eviction task.
/// Spawns a background task that runs `gc` every `interval`.
pub fn start_cache_gc(cache: QueryCache, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let evicted = cache.gc().await;
            if evicted > 0 {
                debug!(evicted = evicted, "query cache entries evicted");
            }
        }
    })
}
