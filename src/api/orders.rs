use super::extract::{ApiJson, ApiPath, Session};
use crate::error::AppResult;
use crate::models::{AccountKind, NewOrder, Order};
use crate::services::OrderTracking;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

const PARTIES: [AccountKind; 3] = [
    AccountKind::Customer,
    AccountKind::Restaurant,
    AccountKind::Rider,
];

pub async fn place(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(order): ApiJson<NewOrder>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let customer_id = session.require(AccountKind::Customer)?;
    let order = state.order_service.place_order(customer_id, &order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Json<Vec<Order>>> {
    let id = session.require_any(&PARTIES)?;
    Ok(Json(state.order_service.list(session.kind(), id).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(order_id): ApiPath<Uuid>,
) -> AppResult<Json<Order>> {
    let id = session.require_any(&PARTIES)?;
    Ok(Json(
        state.order_service.get(session.kind(), id, order_id).await?,
    ))
}

pub async fn transition(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath((order_id, action)): ApiPath<(Uuid, String)>,
) -> AppResult<Json<Order>> {
    let id = session.require_any(&PARTIES)?;
    let order = state
        .order_service
        .transition(session.kind(), id, order_id, &action)
        .await?;
    Ok(Json(order))
}

pub async fn tracking(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(order_id): ApiPath<Uuid>,
) -> AppResult<Json<OrderTracking>> {
    let id = session.require_any(&PARTIES)?;
    Ok(Json(
        state
            .order_service
            .tracking(session.kind(), id, order_id)
            .await?,
    ))
}

pub async fn available_deliveries(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Json<Vec<Order>>> {
    session.require(AccountKind::Rider)?;
    Ok(Json(state.order_service.available_deliveries().await?))
}
