use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CacheKeys, CacheStore};
use crate::db::models::{Ad, ListAdsParams, NewAd};
use crate::db::repository::AdRepository;
use crate::Result;

/// Read-through cache in front of an [`AdRepository`].
///
/// Only list pages are cached. Writes go straight to the inner repository and
/// do not invalidate anything, so a list page may lag a write by up to one
/// TTL. Cache failures are logged and degrade to a direct read.
#[derive(Debug)]
pub struct CachedAdRepository<R, C> {
    inner: R,
    cache: C,
    ttl: Duration,
}

impl<R, C> CachedAdRepository<R, C>
where
    R: AdRepository,
    C: CacheStore,
{
    pub fn new(inner: R, cache: C, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    async fn cached_list(&self, key: &str) -> Option<Vec<Ad>> {
        match self.cache.get(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(ads) => {
                    debug!("Cache HIT: {}", key);
                    Some(ads)
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                None
            }
            Err(e) => {
                warn!("Cache read failed for {}, falling back to store: {}", key, e);
                None
            }
        }
    }

    async fn store_list(&self, key: &str, ads: &[Ad]) {
        let json = match serde_json::to_string(ads) {
            Ok(json) => json,
            Err(e) => {
                warn!("Could not serialize ad list for {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.cache.set(key, json, self.ttl).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }
}

#[async_trait]
impl<R, C> AdRepository for CachedAdRepository<R, C>
where
    R: AdRepository,
    C: CacheStore,
{
    async fn create(&self, ad: &NewAd) -> Result<Ad> {
        self.inner.create(ad).await
    }

    async fn list(&self, params: &ListAdsParams) -> Result<Vec<Ad>> {
        let key = CacheKeys::ad_list(params);

        if let Some(ads) = self.cached_list(&key).await {
            return Ok(ads);
        }

        let ads = self.inner.list(params).await?;
        self.store_list(&key, &ads).await;
        Ok(ads)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Ad>> {
        self.inner.find_by_id(id).await
    }

    async fn update(&self, ad: &Ad) -> Result<Option<Ad>> {
        self.inner.update(ad).await
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool> {
        self.inner.delete(id, owner_id).await
    }
}
