use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored account. Carries the password digest and therefore never leaves
/// the crate as-is; convert with [`User::to_public`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Ad {
    pub id: i64,
    #[sqlx(rename = "user_id")]
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ad {
    /// Apply the present fields of a patch in place.
    pub fn apply(&mut self, update: AdUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(image_url) = update.image_url {
            self.image_url = Some(image_url);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAd {
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
}

impl SortField {
    /// Unknown fields fall back to creation time.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "price" => SortField::Price,
            _ => SortField::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Price => "price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListAdsParams {
    pub limit: i64,
    pub offset: i64,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ListAdsParams {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            sort_by: SortField::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}
