//! Cache module for the marketplace server
//!
//! A key/value cache store abstraction, its Redis implementation, and the
//! read-through decorator that fronts the ad repository.

mod redis_cache;
mod repository;

use async_trait::async_trait;
use std::time::Duration;

use crate::db::models::ListAdsParams;
use crate::error::CacheError;

pub use redis_cache::RedisCache;
pub use repository::CachedAdRepository;

/// Minimal cache contract: a miss is `Ok(None)`, never an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

#[derive(Debug, Clone, Copy)]
pub struct CacheKeys;

impl CacheKeys {
    /// Key for one page of the ad list. Params are already normalized, so
    /// equal queries always map to the same key.
    pub fn ad_list(params: &ListAdsParams) -> String {
        format!(
            "ads:list:limit={}:offset={}:sort_by={}:sort_order={}",
            params.limit,
            params.offset,
            params.sort_by.column(),
            params.sort_order.keyword().to_ascii_lowercase(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{SortField, SortOrder};

    #[test]
    fn test_ad_list_key_is_deterministic() {
        let params = ListAdsParams {
            limit: 10,
            offset: 20,
            sort_by: SortField::Price,
            sort_order: SortOrder::Asc,
        };

        assert_eq!(
            CacheKeys::ad_list(&params),
            "ads:list:limit=10:offset=20:sort_by=price:sort_order=asc"
        );
        assert_eq!(CacheKeys::ad_list(&params), CacheKeys::ad_list(&params.clone()));
    }

    #[test]
    fn test_ad_list_key_distinguishes_pages_and_order() {
        let base = ListAdsParams::default();
        let next_page = ListAdsParams { offset: 10, ..base };
        let ascending = ListAdsParams { sort_order: SortOrder::Asc, ..base };

        assert_ne!(CacheKeys::ad_list(&base), CacheKeys::ad_list(&next_page));
        assert_ne!(CacheKeys::ad_list(&base), CacheKeys::ad_list(&ascending));
    }
}
