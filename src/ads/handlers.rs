use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::service::AdDraft;
use crate::auth::AuthenticatedUser;
use crate::db::models::{Ad, AdUpdate, ListAdsParams, SortField, SortOrder};
use crate::error::AppError;
use crate::{with_deadline, AppState, Result};

const MAX_TITLE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 1000;
const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateAdRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub image_url: Option<String>,
}

impl CreateAdRequest {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        validate_price(self.price)?;
        if let Some(url) = &self.image_url {
            validate_image_url(url)?;
        }
        Ok(())
    }
}

impl From<CreateAdRequest> for AdDraft {
    fn from(req: CreateAdRequest) -> Self {
        AdDraft {
            title: req.title,
            description: req.description,
            price: req.price,
            image_url: req.image_url,
        }
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAdRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
}

impl UpdateAdRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(url) = &self.image_url {
            validate_image_url(url)?;
        }
        Ok(())
    }
}

impl From<UpdateAdRequest> for AdUpdate {
    fn from(req: UpdateAdRequest) -> Self {
        AdUpdate {
            title: req.title,
            description: req.description,
            price: req.price,
            image_url: req.image_url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AdsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl AdsQuery {
    /// Validate paging and normalize sorting into repository parameters.
    pub fn into_params(self) -> Result<ListAdsParams> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 {
            return Err(AppError::ValidationError("page must be at least 1".into()));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::ValidationError(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| AppError::ValidationError("page is out of range".into()))?;

        Ok(ListAdsParams {
            limit,
            offset,
            sort_by: self.sort_by.as_deref().map(SortField::parse).unwrap_or_default(),
            sort_order: self.sort_order.as_deref().map(SortOrder::parse).unwrap_or_default(),
        })
    }
}

/// Public view of an ad.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AdResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ad> for AdResponse {
    fn from(ad: Ad) -> Self {
        AdResponse {
            id: ad.id,
            title: ad.title,
            description: ad.description,
            price: ad.price,
            image_url: ad.image_url,
            author_id: ad.owner_id,
            created_at: ad.created_at,
            updated_at: ad.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAdResponse {
    pub id: i64,
}

pub async fn list_ads(
    query: web::Query<AdsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let params = query.into_inner().into_params()?;
    let ads = with_deadline(
        state.config.server.request_timeout(),
        state.ad_service.list(&params),
    )
    .await?;

    let body: Vec<AdResponse> = ads.into_iter().map(AdResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

pub async fn get_ad(path: web::Path<i64>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let ad = with_deadline(state.config.server.request_timeout(), state.ad_service.get(id)).await?;
    Ok(HttpResponse::Ok().json(AdResponse::from(ad)))
}

pub async fn create_ad(
    user: AuthenticatedUser,
    req: web::Json<CreateAdRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;

    let ad = with_deadline(
        state.config.server.request_timeout(),
        state.ad_service.create(&user, req.into()),
    )
    .await
    .map_err(|e| {
        error!("Creating ad for user {} failed: {}", user.id, e);
        e
    })?;

    Ok(HttpResponse::Created().json(CreateAdResponse { id: ad.id }))
}

pub async fn update_ad(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<UpdateAdRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let req = req.into_inner();
    req.validate()?;

    info!("User {} updating ad {}", user.id, id);
    let ad = with_deadline(
        state.config.server.request_timeout(),
        state.ad_service.update(&user, id, req.into()),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AdResponse::from(ad)))
}

pub async fn delete_ad(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    with_deadline(
        state.config.server.request_timeout(),
        state.ad_service.delete(&user, id),
    )
    .await?;

    Ok(HttpResponse::NoContent().finish())
}

fn validate_title(title: &str) -> Result<()> {
    let len = title.trim().chars().count();
    if len == 0 || title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::ValidationError(format!(
            "title must be between 1 and {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::ValidationError(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_CHARS
        )));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::ValidationError(
            "price must be a non-negative number".into(),
        ));
    }
    Ok(())
}

fn validate_image_url(raw: &str) -> Result<()> {
    url::Url::parse(raw)
        .map(|_| ())
        .map_err(|_| AppError::ValidationError("image_url must be a valid URL".into()))
}
