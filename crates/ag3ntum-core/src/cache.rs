//! In-memory TTL cache for read endpoints outside the file tree
//!
//! Per key the cache is in exactly one of four states: absent, fetching
//! (a fetch is registered and no data exists yet), fresh, or stale (expired
//! data still present). Concurrent callers of one key share a single
//! in-flight fetch, and stale data can be served while a background refresh
//! replaces it.

use crate::error::{ConsoleError, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

type SharedFetch<T> = Shared<BoxFuture<'static, std::result::Result<T, Arc<ConsoleError>>>>;

/// TTL and refresh policy of a cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// Serve expired data immediately and refresh it in the background
    pub stale_while_revalidate: bool,
}

impl CacheConfig {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            stale_while_revalidate: false,
        }
    }

    pub fn with_stale_while_revalidate(mut self) -> Self {
        self.stale_while_revalidate = true;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

/// Observable state of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    Fetching,
    Fresh,
    Stale,
}

struct CacheEntry<T> {
    data: Option<(T, Instant)>,
    inflight: Option<Inflight<T>>,
}

struct Inflight<T> {
    id: u64,
    fetch: SharedFetch<T>,
}

enum Lookup<T> {
    Hit(T),
    Stale(T, Option<SharedFetch<T>>),
    Wait(SharedFetch<T>),
}

/// Keyed TTL cache with in-flight de-duplication.
///
/// Owned by the application's composition root and shared by reference;
/// all callers of one key share one entry.
pub struct TtlCache<T> {
    entries: Arc<DashMap<String, CacheEntry<T>>>,
    config: CacheConfig,
    next_fetch_id: AtomicU64,
}

impl<T> TtlCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cache whose keys default to `config`
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            config,
            next_fetch_id: AtomicU64::new(1),
        }
    }

    /// Get a value, fetching it when no usable entry exists.
    ///
    /// `fetcher` is only invoked when a new fetch has to start; it must build
    /// its future without touching this cache. `config` overrides the
    /// construction-time policy for this call.
    pub async fn get<F, Fut>(&self, key: &str, fetcher: F, config: Option<CacheConfig>) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let config = config.unwrap_or(self.config);
        let now = Instant::now();

        let lookup = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                let fresh = entry
                    .data
                    .as_ref()
                    .filter(|(_, expires_at)| *expires_at > now)
                    .map(|(data, _)| data.clone());
                let stale = entry.data.as_ref().map(|(data, _)| data.clone());

                match (fresh, stale) {
                    (Some(data), _) => Lookup::Hit(data),
                    (None, Some(data)) if config.stale_while_revalidate => {
                        if entry.inflight.is_some() {
                            Lookup::Stale(data, None)
                        } else {
                            let fetch = self.register_fetch(key, entry, fetcher(), config, true);
                            Lookup::Stale(data, Some(fetch))
                        }
                    }
                    _ => {
                        let pending = entry.inflight.as_ref().map(|inflight| inflight.fetch.clone());
                        match pending {
                            Some(fetch) => Lookup::Wait(fetch),
                            None => Lookup::Wait(self.register_fetch(
                                key,
                                entry,
                                fetcher(),
                                config,
                                false,
                            )),
                        }
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let mut entry = vacant.insert(CacheEntry {
                    data: None,
                    inflight: None,
                });
                Lookup::Wait(self.register_fetch(key, &mut entry, fetcher(), config, false))
            }
        };

        match lookup {
            Lookup::Hit(data) => {
                debug!("cache hit: {}", key);
                Ok(data)
            }
            Lookup::Stale(data, refresh) => {
                if let Some(fetch) = refresh {
                    debug!("cache stale, refreshing in background: {}", key);
                    tokio::spawn(async move {
                        let _ = fetch.await;
                    });
                }
                Ok(data)
            }
            Lookup::Wait(fetch) => {
                debug!("cache miss: {}", key);
                fetch.await.map_err(ConsoleError::from_shared)
            }
        }
    }

    /// Store a value directly, fresh for the default TTL
    pub fn set(&self, key: &str, data: T) {
        let expires_at = Instant::now() + self.config.ttl;
        self.entries
            .entry(key.to_string())
            .and_modify(|entry| entry.data = Some((data.clone(), expires_at)))
            .or_insert_with(|| CacheEntry {
                data: Some((data.clone(), expires_at)),
                inflight: None,
            });
    }

    /// Peek at the cached value without fetching, fresh or stale
    pub fn peek(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|entry| entry.data.as_ref().map(|(data, _)| data.clone()))
    }

    pub fn state(&self, key: &str) -> EntryState {
        match self.entries.get(key) {
            None => EntryState::Absent,
            Some(entry) => match entry.data {
                Some((_, expires_at)) if expires_at > Instant::now() => EntryState::Fresh,
                Some(_) => EntryState::Stale,
                None if entry.inflight.is_some() => EntryState::Fetching,
                None => EntryState::Absent,
            },
        }
    }

    /// Drop a key; a fetch still in flight for it will not repopulate it
    pub fn invalidate(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            debug!("cache invalidated: {}", key);
        }
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
        debug!("cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn register_fetch<Fut>(
        &self,
        key: &str,
        entry: &mut CacheEntry<T>,
        fut: Fut,
        config: CacheConfig,
        keep_on_error: bool,
    ) -> SharedFetch<T>
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let entries = Arc::clone(&self.entries);
        let key = key.to_string();

        let fetch = async move {
            let result = fut.await;
            let mut remove = false;

            if let Some(mut entry) = entries.get_mut(&key) {
                if entry.inflight.as_ref().map(|inflight| inflight.id) == Some(id) {
                    entry.inflight = None;
                    match result {
                        Ok(ref data) => {
                            entry.data = Some((data.clone(), Instant::now() + config.ttl));
                        }
                        Err(ref e) if keep_on_error => {
                            warn!("background refresh of {} failed, keeping stale data: {}", key, e);
                        }
                        Err(ref e) => {
                            debug!("fetch of {} failed, dropping key: {}", key, e);
                            remove = true;
                        }
                    }
                } else {
                    debug!("discarding superseded fetch result for {}", key);
                }
            }

            if remove {
                entries.remove_if(&key, |_, entry| entry.inflight.is_none());
            }

            result.map_err(Arc::new)
        }
        .boxed()
        .shared();

        entry.inflight = Some(Inflight {
            id,
            fetch: fetch.clone(),
        });
        fetch
    }
}
