use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::error::AppError;

/// Read cache for article responses, keyed by request path and query.
#[async_trait]
pub trait ArticleCache: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;
    async fn put(&self, key: &str, value: Value) -> anyhow::Result<()>;
    async fn clear_all(&self) -> anyhow::Result<()>;
}

/// In-process cache whose entries expire after a fixed TTL.
pub struct MemoryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, Value)>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ArticleCache for MemoryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, v)| v.clone()))
    }

    async fn put(&self, key: &str, value: Value) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(key.to_string(), (Instant::now(), value));
        Ok(())
    }

    async fn clear_all(&self) -> anyhow::Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Drop every cached article response after a committed write.
///
/// Never fails: errors and panics from the cache are logged and swallowed.
pub async fn invalidate_all(cache: Arc<dyn ArticleCache>) {
    match tokio::spawn(async move { cache.clear_all().await }).await {
        Ok(Ok(())) => debug!("article cache cleared"),
        Ok(Err(e)) => error!(error = %e, "failed to clear article cache"),
        Err(e) => error!(error = %e, "article cache clear task aborted"),
    }
}

/// Serve `key` from the cache, or run `load` and remember its result.
/// Cache failures fall through to `load`; errors from `load` are not cached.
///
/// A load that started before a write may store its result after that
/// write's `invalidate_all`; such an entry is stale until the TTL expires.
pub async fn read_through<T, F, Fut>(
    cache: &dyn ArticleCache,
    key: &str,
    load: F,
) -> Result<Value, AppError>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match cache.get(key).await {
        Ok(Some(hit)) => {
            debug!(key, "cache hit");
            return Ok(hit);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, key, "cache read failed"),
    }

    let fresh = serde_json::to_value(load().await?).context("serialize response")?;
    if let Err(e) = cache.put(key, fresh.clone()).await {
        warn!(error = %e, key, "cache write failed");
    }
    Ok(fresh)
}
