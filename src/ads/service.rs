use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::AuthenticatedUser;
use crate::db::models::{Ad, AdUpdate, ListAdsParams, NewAd};
use crate::db::repository::AdRepository;
use crate::error::AdError;
use crate::Result;

/// Ad operations. Every mutation re-reads the ad and checks that the caller
/// owns it before anything is written.
pub struct AdService {
    ads: Arc<dyn AdRepository>,
}

impl AdService {
    pub fn new(ads: Arc<dyn AdRepository>) -> Self {
        Self { ads }
    }

    pub async fn create(&self, actor: &AuthenticatedUser, draft: AdDraft) -> Result<Ad> {
        let new_ad = NewAd {
            owner_id: actor.id,
            title: draft.title,
            description: draft.description,
            price: draft.price,
            image_url: draft.image_url,
        };

        let ad = self.ads.create(&new_ad).await?;
        info!("User {} created ad {}", actor.id, ad.id);
        Ok(ad)
    }

    pub async fn list(&self, params: &ListAdsParams) -> Result<Vec<Ad>> {
        self.ads.list(params).await
    }

    pub async fn get(&self, id: i64) -> Result<Ad> {
        self.ads
            .find_by_id(id)
            .await?
            .ok_or_else(|| AdError::NotFound.into())
    }

    pub async fn update(&self, actor: &AuthenticatedUser, id: i64, update: AdUpdate) -> Result<Ad> {
        let mut ad = self.owned_by(actor, id).await?;
        ad.apply(update);

        // The row can vanish between the ownership check and the write.
        let updated = self.ads.update(&ad).await?.ok_or(AdError::NotFound)?;
        info!("User {} updated ad {}", actor.id, id);
        Ok(updated)
    }

    pub async fn delete(&self, actor: &AuthenticatedUser, id: i64) -> Result<()> {
        let ad = self.owned_by(actor, id).await?;

        if !self.ads.delete(ad.id, ad.owner_id).await? {
            return Err(AdError::NotFound.into());
        }
        info!("User {} deleted ad {}", actor.id, id);
        Ok(())
    }

    async fn owned_by(&self, actor: &AuthenticatedUser, id: i64) -> Result<Ad> {
        let ad = self.get(id).await?;
        if ad.owner_id != actor.id {
            warn!("User {} denied access to ad {} owned by {}", actor.id, id, ad.owner_id);
            return Err(AdError::AccessDenied.into());
        }
        Ok(ad)
    }
}

/// Caller-supplied fields of a new ad; the owner comes from the session.
#[derive(Debug, Clone, PartialEq)]
pub struct AdDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: Option<String>,
}
