use super::extract::{ApiJson, ApiPath, ApiQuery, Session};
use crate::error::AppResult;
use crate::models::{AccountKind, MenuItem, MenuItemUpdate, NewMenuItem, NewOffer, Offer, Restaurant};
use crate::repositories::restaurant_repository::RestaurantUpdate;
use crate::services::RestaurantDetail;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct RestaurantFilter {
    #[serde(default)]
    pub open_only: bool,
    pub cuisine: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<RestaurantFilter>,
) -> AppResult<Json<Vec<Restaurant>>> {
    let restaurants = state
        .restaurant_service
        .list(filter.open_only, filter.cuisine.as_deref())
        .await?;
    Ok(Json(restaurants))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<RestaurantDetail>> {
    Ok(Json(state.restaurant_service.get(id).await?))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(update): ApiJson<RestaurantUpdate>,
) -> AppResult<Json<Restaurant>> {
    let id = session.require(AccountKind::Restaurant)?;
    Ok(Json(state.restaurant_service.update_profile(id, &update).await?))
}

pub async fn add_menu_item(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(item): ApiJson<NewMenuItem>,
) -> AppResult<(StatusCode, Json<MenuItem>)> {
    let id = session.require(AccountKind::Restaurant)?;
    let item = state.restaurant_service.add_menu_item(id, &item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_menu_item(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(item_id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<MenuItemUpdate>,
) -> AppResult<Json<MenuItem>> {
    let id = session.require(AccountKind::Restaurant)?;
    let item = state
        .restaurant_service
        .update_menu_item(id, item_id, &update)
        .await?;
    Ok(Json(item))
}

pub async fn remove_menu_item(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(item_id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    let id = session.require(AccountKind::Restaurant)?;
    state.restaurant_service.remove_menu_item(id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_offer(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(offer): ApiJson<NewOffer>,
) -> AppResult<(StatusCode, Json<Offer>)> {
    let id = session.require(AccountKind::Restaurant)?;
    let offer = state.restaurant_service.create_offer(id, &offer).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

pub async fn deactivate_offer(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(offer_id): ApiPath<Uuid>,
) -> AppResult<Json<Offer>> {
    let id = session.require(AccountKind::Restaurant)?;
    Ok(Json(
        state.restaurant_service.deactivate_offer(id, offer_id).await?,
    ))
}
