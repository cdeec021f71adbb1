use super::extract::{ApiPath, ApiQuery, Session};
use crate::error::AppResult;
use crate::models::Notification;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiQuery(filter): ApiQuery<NotificationFilter>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state
        .notification_service
        .list(session.kind(), session.id(), filter.unread_only)
        .await?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Notification>> {
    let notification = state
        .notification_service
        .mark_read(session.kind(), session.id(), id)
        .await?;
    Ok(Json(notification))
}
