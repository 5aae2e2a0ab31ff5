pub mod ads;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;

use actix_web::{web, HttpResponse};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use ads::AdService;
pub use auth::{AuthService, AuthenticatedUser, PasswordHasher, TokenManager};
pub use cache::{CachedAdRepository, RedisCache};
pub use db::{AdRepository, DbOperations, UserRepository};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let mut body = serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    if let Some(db) = &state.db {
        let pool = db.get_pool_status();
        body["database"] = serde_json::json!({
            "total_connections": pool.total_connections,
            "active_connections": pool.active_connections,
            "idle_connections": pool.idle_connections,
        });
    }

    HttpResponse::Ok().json(body)
}

/// Run `fut` under the request deadline. On expiry the future is dropped,
/// which cancels whatever store call it was waiting on.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(deadline, fut).await?
}

/// Route table shared by the server binary and the integration tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .route("/health", web::get().to(health_check))
    .service(
        web::scope("/api/v1")
            .route("/auth/register", web::post().to(auth::handlers::register))
            .route("/auth/login", web::post().to(auth::handlers::login))
            .route("/ads", web::get().to(ads::handlers::list_ads))
            .route("/ads", web::post().to(ads::handlers::create_ad))
            .route("/ads/{id}", web::get().to(ads::handlers::get_ad))
            .route("/ads/{id}", web::patch().to(ads::handlers::update_ad))
            .route("/ads/{id}", web::delete().to(ads::handlers::delete_ad)),
    );
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db: Option<DbOperations>,
    pub auth_service: Arc<AuthService>,
    pub ad_service: Arc<AdService>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        // Fail on a bad secret before touching any store.
        let tokens = Arc::new(TokenManager::new(&config.auth.jwt_secret)?);

        let db = DbOperations::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(config.database.acquire_timeout_secs),
        )
        .await?;
        db.run_migrations().await?;
        info!("Connected to database");

        let users: Arc<dyn UserRepository> = Arc::new(db.users());
        let ads = Self::ad_repository(&config, db.ads()).await;
        let hasher = PasswordHasher::new()?;

        Ok(Self::assemble(config, Some(db), tokens, users, ads, hasher))
    }

    /// Build state over caller-supplied repositories. No database is opened.
    pub fn with_repositories(
        config: Settings,
        users: Arc<dyn UserRepository>,
        ads: Arc<dyn AdRepository>,
        hasher: PasswordHasher,
    ) -> Result<Self> {
        let tokens = Arc::new(TokenManager::new(&config.auth.jwt_secret)?);
        Ok(Self::assemble(config, None, tokens, users, ads, hasher))
    }

    fn assemble(
        config: Settings,
        db: Option<DbOperations>,
        tokens: Arc<TokenManager>,
        users: Arc<dyn UserRepository>,
        ads: Arc<dyn AdRepository>,
        hasher: PasswordHasher,
    ) -> Self {
        let auth_service = AuthService::new(users, hasher, tokens, config.auth.token_ttl());

        Self {
            config: Arc::new(config),
            db,
            auth_service: Arc::new(auth_service),
            ad_service: Arc::new(AdService::new(ads)),
        }
    }

    /// Durable repository, fronted by the list cache when Redis is enabled and
    /// reachable at startup.
    async fn ad_repository(config: &Settings, store: db::PgAdRepository) -> Arc<dyn AdRepository> {
        if !config.redis.enabled {
            info!("Ad list cache disabled");
            return Arc::new(store);
        }

        match RedisCache::connect(&config.redis.url, config.redis.operation_timeout()).await {
            Ok(cache) => {
                info!("Ad list cache enabled (ttl: {:?})", config.redis.list_ttl());
                Arc::new(CachedAdRepository::new(store, cache, config.redis.list_ttl()))
            }
            Err(e) => {
                warn!("Redis unavailable, serving ad lists from the database only: {}", e);
                Arc::new(store)
            }
        }
    }

    pub async fn shutdown(&self) -> Result<()> {
        if let Some(db) = &self.db {
            db.close().await;
        }
        info!("Application state shut down");
        Ok(())
    }
}
