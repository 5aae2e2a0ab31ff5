#![allow(dead_code)]

use actix_web::web;
use argon2::Params;
use async_trait::async_trait;
use chrono::Utc;
use marketplace_server::cache::CacheStore;
use marketplace_server::db::{Ad, ListAdsParams, NewAd, NewUser, SortField, SortOrder, User};
use marketplace_server::error::{CacheError, DatabaseError};
use marketplace_server::{
    AdRepository, AppState, CachedAdRepository, PasswordHasher, Settings, UserRepository,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// User store with the same uniqueness rule as the `users` table.
#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create(&self, user: &NewUser) -> marketplace_server::Result<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Err(DatabaseError::Duplicate.into());
        }

        let now = Utc::now();
        let stored = User {
            id: users.len() as i64 + 1,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        users.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_username(&self, username: &str) -> marketplace_server::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }
}

/// Ad store that counts list reads so tests can tell cache hits apart.
#[derive(Clone, Default)]
pub struct InMemoryAds {
    ads: Arc<Mutex<Vec<Ad>>>,
    next_id: Arc<AtomicUsize>,
    list_calls: Arc<AtomicUsize>,
}

impl InMemoryAds {
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdRepository for InMemoryAds {
    async fn create(&self, ad: &NewAd) -> marketplace_server::Result<Ad> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let now = Utc::now();
        let stored = Ad {
            id,
            owner_id: ad.owner_id,
            title: ad.title.clone(),
            description: ad.description.clone(),
            price: ad.price,
            image_url: ad.image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        self.ads.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, params: &ListAdsParams) -> marketplace_server::Result<Vec<Ad>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let mut ads = self.ads.lock().unwrap().clone();
        ads.sort_by(|a, b| {
            let ordering = match params.sort_by {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::Price => a.price.total_cmp(&b.price),
            }
            .then(a.id.cmp(&b.id));

            match params.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        Ok(ads
            .into_iter()
            .skip(params.offset as usize)
            .take(params.limit as usize)
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> marketplace_server::Result<Option<Ad>> {
        Ok(self.ads.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn update(&self, ad: &Ad) -> marketplace_server::Result<Option<Ad>> {
        let mut ads = self.ads.lock().unwrap();
        let Some(stored) = ads
            .iter_mut()
            .find(|a| a.id == ad.id && a.owner_id == ad.owner_id)
        else {
            return Ok(None);
        };

        stored.title = ad.title.clone();
        stored.description = ad.description.clone();
        stored.price = ad.price;
        stored.image_url = ad.image_url.clone();
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: i64, owner_id: i64) -> marketplace_server::Result<bool> {
        let mut ads = self.ads.lock().unwrap();
        let before = ads.len();
        ads.retain(|a| !(a.id == id && a.owner_id == owner_id));
        Ok(ads.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String, _ttl: Duration) -> Result<(), CacheError> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub ads: InMemoryAds,
}

/// Fast Argon2 parameters; production cost would dominate test time.
pub fn cheap_hasher() -> PasswordHasher {
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
    PasswordHasher::with_params(params).unwrap()
}

pub fn context(cached: bool) -> TestContext {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let ads = InMemoryAds::default();

    let ad_repository: Arc<dyn AdRepository> = if cached {
        Arc::new(CachedAdRepository::new(
            ads.clone(),
            MemoryCache::default(),
            config.redis.list_ttl(),
        ))
    } else {
        Arc::new(ads.clone())
    };

    let state = AppState::with_repositories(
        config,
        Arc::new(InMemoryUsers::default()),
        ad_repository,
        cheap_hasher(),
    )
    .expect("Failed to build app state");

    TestContext {
        state: web::Data::new(state),
        ads,
    }
}
