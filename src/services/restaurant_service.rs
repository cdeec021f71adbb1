use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::{MenuItem, MenuItemUpdate, NewMenuItem, NewOffer, Offer, Restaurant};
use crate::repositories::restaurant_repository::RestaurantUpdate;
use crate::repositories::{AccountRepository, RestaurantRepository};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A restaurant with what a customer can order right now
#[derive(Debug, Clone, Serialize)]
pub struct RestaurantDetail {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub menu: Vec<MenuItem>,
    pub offers: Vec<Offer>,
}

/// Service for restaurant profiles, menus and offers
pub struct RestaurantService {
    restaurant_repo: Arc<RestaurantRepository>,
    account_repo: Arc<AccountRepository>,
}

impl RestaurantService {
    pub fn new(
        restaurant_repo: Arc<RestaurantRepository>,
        account_repo: Arc<AccountRepository>,
    ) -> Self {
        Self {
            restaurant_repo,
            account_repo,
        }
    }

    pub async fn list(&self, open_only: bool, cuisine: Option<&str>) -> AppResult<Vec<Restaurant>> {
        let cuisine = cuisine.map(str::trim).filter(|c| !c.is_empty());
        Ok(self.restaurant_repo.list(open_only, cuisine).await?)
    }

    /// Profile plus available menu and live offers
    pub async fn get(&self, id: Uuid) -> AppResult<RestaurantDetail> {
        let restaurant = self
            .account_repo
            .find_restaurant(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Restaurant {} not found", id)))?;
        let menu = self.restaurant_repo.list_menu(id, true).await?;
        let offers = self.restaurant_repo.list_offers(id, true).await?;

        Ok(RestaurantDetail {
            restaurant,
            menu,
            offers,
        })
    }

    pub async fn update_profile(
        &self,
        restaurant_id: Uuid,
        update: &RestaurantUpdate,
    ) -> AppResult<Restaurant> {
        for (field, value) in [
            ("name", &update.name),
            ("phone", &update.phone),
            ("address", &update.address),
            ("cuisine", &update.cuisine),
        ] {
            if value.as_deref().map_or(false, |v| v.trim().is_empty()) {
                return Err(AppError::Validation(format!("{} cannot be blank", field)));
            }
        }

        let restaurant = self
            .restaurant_repo
            .update_profile(restaurant_id, update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => {
                    AppError::NotFound(format!("Restaurant {} not found", restaurant_id))
                }
                other => other.into(),
            })?;

        info!(
            "Restaurant {} updated profile (open={})",
            restaurant_id, restaurant.is_open
        );
        Ok(restaurant)
    }

    // =========================================================================
    // Menu
    // =========================================================================

    pub async fn add_menu_item(
        &self,
        restaurant_id: Uuid,
        item: &NewMenuItem,
    ) -> AppResult<MenuItem> {
        item.validate().map_err(AppError::Validation)?;
        let item = self.restaurant_repo.add_menu_item(restaurant_id, item).await?;
        info!("Restaurant {} added menu item {}", restaurant_id, item.id);
        Ok(item)
    }

    pub async fn update_menu_item(
        &self,
        restaurant_id: Uuid,
        item_id: Uuid,
        update: &MenuItemUpdate,
    ) -> AppResult<MenuItem> {
        update.validate().map_err(AppError::Validation)?;
        self.restaurant_repo
            .update_menu_item(restaurant_id, item_id, update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Menu item {} not found", item_id)))
    }

    pub async fn remove_menu_item(&self, restaurant_id: Uuid, item_id: Uuid) -> AppResult<()> {
        if !self
            .restaurant_repo
            .remove_menu_item(restaurant_id, item_id)
            .await?
        {
            return Err(AppError::NotFound(format!("Menu item {} not found", item_id)));
        }
        info!("Restaurant {} removed menu item {}", restaurant_id, item_id);
        Ok(())
    }

    // =========================================================================
    // Offers
    // =========================================================================

    pub async fn create_offer(&self, restaurant_id: Uuid, offer: &NewOffer) -> AppResult<Offer> {
        offer
            .validate(Utc::now().naive_utc())
            .map_err(AppError::Validation)?;

        let created = self
            .restaurant_repo
            .create_offer(restaurant_id, offer)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => AppError::Conflict(format!(
                    "Offer code {} already exists",
                    offer.normalized_code()
                )),
                other => other.into(),
            })?;

        info!("Restaurant {} created offer {}", restaurant_id, created.code);
        Ok(created)
    }

    pub async fn deactivate_offer(&self, restaurant_id: Uuid, offer_id: Uuid) -> AppResult<Offer> {
        self.restaurant_repo
            .deactivate_offer(restaurant_id, offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Offer {} not found", offer_id)))
    }
}
