use super::extract::{ApiJson, ApiPath, Session};
use crate::error::AppResult;
use crate::models::{AccountKind, NewReservation, Reservation};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

const PARTIES: [AccountKind; 2] = [AccountKind::Customer, AccountKind::Restaurant];

pub async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(reservation): ApiJson<NewReservation>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let customer_id = session.require(AccountKind::Customer)?;
    let created = state
        .reservation_service
        .create(customer_id, &reservation)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Json<Vec<Reservation>>> {
    let id = session.require_any(&PARTIES)?;
    Ok(Json(
        state.reservation_service.list(session.kind(), id).await?,
    ))
}

pub async fn transition(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath((id, action)): ApiPath<(Uuid, String)>,
) -> AppResult<Json<Reservation>> {
    let actor_id = session.require_any(&PARTIES)?;
    let reservation = state
        .reservation_service
        .transition(session.kind(), actor_id, id, &action)
        .await?;
    Ok(Json(reservation))
}
