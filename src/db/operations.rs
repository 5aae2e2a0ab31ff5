use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::db::models::{Ad, ListAdsParams, NewAd, NewUser, User};
use crate::db::repository::{AdRepository, UserRepository};
use crate::error::DatabaseError;
use crate::Result;

const AD_COLUMNS: &str =
    "id, user_id, title, description, price, image_url, created_at, updated_at";

/// Owns the connection pool and hands out the Postgres repositories.
#[derive(Debug, Clone)]
pub struct DbOperations {
    pool: PgPool,
}

impl DbOperations {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Applying database migrations");
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn get_pool_status(&self) -> DbPoolStatus {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;

        DbPoolStatus {
            total_connections: size,
            active_connections: size.saturating_sub(idle),
            idle_connections: idle,
        }
    }

    pub fn users(&self) -> PgUserRepository {
        PgUserRepository { pool: self.pool.clone() }
    }

    pub fn ads(&self) -> PgAdRepository {
        PgAdRepository { pool: self.pool.clone() }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Debug, Clone)]
pub struct DbPoolStatus {
    pub total_connections: u32,
    pub active_connections: u32,
    pub idle_connections: u32,
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("users.create", e))?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at, updated_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("users.find_by_username", e))?;

        Ok(user)
    }
}

#[derive(Debug, Clone)]
pub struct PgAdRepository {
    pool: PgPool,
}

#[async_trait]
impl AdRepository for PgAdRepository {
    async fn create(&self, ad: &NewAd) -> Result<Ad> {
        let query = format!(
            "INSERT INTO ads (user_id, title, description, price, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {AD_COLUMNS}"
        );

        let ad = sqlx::query_as::<_, Ad>(&query)
            .bind(ad.owner_id)
            .bind(&ad.title)
            .bind(&ad.description)
            .bind(ad.price)
            .bind(&ad.image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("ads.create", e))?;

        Ok(ad)
    }

    async fn list(&self, params: &ListAdsParams) -> Result<Vec<Ad>> {
        // Column and direction come from closed enums, never from raw input.
        let query = format!(
            "SELECT {AD_COLUMNS} FROM ads ORDER BY {column} {order}, id {order} LIMIT $1 OFFSET $2",
            column = params.sort_by.column(),
            order = params.sort_order.keyword(),
        );

        let ads = sqlx::query_as::<_, Ad>(&query)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("ads.list", e))?;

        Ok(ads)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Ad>> {
        let query = format!("SELECT {AD_COLUMNS} FROM ads WHERE id = $1");

        let ad = sqlx::query_as::<_, Ad>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("ads.find_by_id", e))?;

        Ok(ad)
    }

    async fn update(&self, ad: &Ad) -> Result<Option<Ad>> {
        let query = format!(
            "UPDATE ads SET title = $1, description = $2, price = $3, image_url = $4, updated_at = NOW() \
             WHERE id = $5 AND user_id = $6 RETURNING {AD_COLUMNS}"
        );

        let updated = sqlx::query_as::<_, Ad>(&query)
            .bind(&ad.title)
            .bind(&ad.description)
            .bind(ad.price)
            .bind(&ad.image_url)
            .bind(ad.id)
            .bind(ad.owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("ads.update", e))?;

        Ok(updated)
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ads WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("ads.delete", e))?;

        Ok(result.rows_affected() > 0)
    }
}
