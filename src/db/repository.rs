use async_trait::async_trait;

use crate::db::models::{Ad, ListAdsParams, NewAd, NewUser, User};
use crate::Result;

/// Account persistence. A duplicate username must surface as
/// `DatabaseError::Duplicate`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<User>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// Ad persistence. Implemented by the Postgres store and by the caching
/// decorator in front of it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdRepository: Send + Sync {
    async fn create(&self, ad: &NewAd) -> Result<Ad>;

    async fn list(&self, params: &ListAdsParams) -> Result<Vec<Ad>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Ad>>;

    /// Writes the mutable fields of `ad`, guarded by its owner id.
    /// Returns `None` when no such row exists any more.
    async fn update(&self, ad: &Ad) -> Result<Option<Ad>>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool>;
}
