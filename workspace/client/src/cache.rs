use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::error::{ClientError, Result};

/// Groups of cached queries that a mutation can make stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Houses,
    Caretakers,
    Renters,
    Flats,
    Flat(i32),
    RentPayments(i32),
    AdvancePayments(i32),
}

/// Which query keys hang under which tag.
#[derive(Debug, Default, Clone)]
pub(crate) struct InvalidationRegistry {
    keys_by_tag: Arc<RwLock<HashMap<CacheTag, HashSet<String>>>>,
}

impl InvalidationRegistry {
    pub(crate) async fn register(&self, key: &str, tags: &[CacheTag]) {
        let mut keys_by_tag = self.keys_by_tag.write().await;
        for tag in tags {
            keys_by_tag.entry(*tag).or_default().insert(key.to_string());
        }
    }

    /// Removes and returns the keys registered under `tag`.
    pub(crate) async fn take(&self, tag: CacheTag) -> HashSet<String> {
        self.keys_by_tag
            .write()
            .await
            .remove(&tag)
            .unwrap_or_default()
    }
}

/// Query results keyed by request path.
#[derive(Clone)]
pub struct QueryCache {
    entries: Cache<String, serde_json::Value>,
    registry: InvalidationRegistry,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(1000, Duration::from_secs(300))
    }
}

impl QueryCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            registry: InvalidationRegistry::default(),
        }
    }

    /// Returns the cached value for `key` or runs `load`.
    ///
    /// Concurrent calls for the same key share a single load. Failed loads are
    /// not cached.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, tags: &[CacheTag], load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // Registered before loading so an invalidation racing the load still
        // finds the key
        self.registry.register(key, tags).await;

        let value = self
            .entries
            .try_get_with(key.to_string(), async move {
                trace!("Cache miss for {}", key);
                let loaded = load().await?;
                serde_json::to_value(&loaded).map_err(|e| ClientError::Decode(e.to_string()))
            })
            .await
            .map_err(|err: Arc<ClientError>| err.as_ref().clone())?;

        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Drops every query registered under `tag`.
    pub async fn invalidate(&self, tag: CacheTag) {
        let keys = self.registry.take(tag).await;
        debug!("Invalidating {:?} ({} queries)", tag, keys.len());
        for key in keys {
            self.entries.invalidate(&key).await;
        }
    }

    pub async fn invalidate_many(&self, tags: &[CacheTag]) {
        for tag in tags {
            self.invalidate(*tag).await;
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
