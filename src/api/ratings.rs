use super::extract::{ApiJson, ApiPath, Session};
use crate::error::{AppError, AppResult};
use crate::models::{AccountKind, NewRating, Rating};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

pub async fn rate(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(rating): ApiJson<NewRating>,
) -> AppResult<(StatusCode, Json<Rating>)> {
    let customer_id = session.require(AccountKind::Customer)?;
    let rating = state.rating_service.rate(customer_id, &rating).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

/// Public list of ratings. The kind may be singular or plural.
pub async fn list_for_target(
    State(state): State<Arc<AppState>>,
    ApiPath((target_kind, target_id)): ApiPath<(String, Uuid)>,
) -> AppResult<Json<Vec<Rating>>> {
    let kind = AccountKind::from_str(&target_kind)
        .ok()
        .or_else(|| AccountKind::from_collection(&target_kind))
        .ok_or_else(|| AppError::Validation(format!("Invalid account kind: {}", target_kind)))?;
    Ok(Json(
        state.rating_service.list_for_target(kind, target_id).await?,
    ))
}
