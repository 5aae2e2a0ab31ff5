//! Database module for the marketplace server
//!
//! Entity models, the repository traits the services depend on, and their
//! PostgreSQL implementations.

pub mod models;
pub mod operations;
pub mod repository;

pub use models::{Ad, AdUpdate, ListAdsParams, NewAd, NewUser, PublicUser, SortField, SortOrder, User};
pub use operations::{DbOperations, DbPoolStatus, PgAdRepository, PgUserRepository};
pub use repository::{AdRepository, UserRepository};
