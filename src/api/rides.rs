use super::extract::{ApiJson, ApiPath, Session};
use crate::error::AppResult;
use crate::fare::FareEstimate;
use crate::models::{AccountKind, Ride, RideQuote};
use crate::services::RideTracking;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

const PARTIES: [AccountKind; 2] = [AccountKind::Customer, AccountKind::Driver];

/// Quote a fare; any signed-in account may ask
pub async fn estimate(
    State(state): State<Arc<AppState>>,
    _session: Session,
    ApiJson(quote): ApiJson<RideQuote>,
) -> AppResult<Json<FareEstimate>> {
    Ok(Json(state.ride_service.estimate(&quote)?))
}

pub async fn request(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(quote): ApiJson<RideQuote>,
) -> AppResult<(StatusCode, Json<Ride>)> {
    let customer_id = session.require(AccountKind::Customer)?;
    let ride = state.ride_service.request(customer_id, &quote).await?;
    Ok((StatusCode::CREATED, Json(ride)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Json<Vec<Ride>>> {
    let id = session.require_any(&PARTIES)?;
    Ok(Json(state.ride_service.list(session.kind(), id).await?))
}

pub async fn available(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Json<Vec<Ride>>> {
    session.require(AccountKind::Driver)?;
    Ok(Json(state.ride_service.available().await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(ride_id): ApiPath<Uuid>,
) -> AppResult<Json<Ride>> {
    let id = session.require_any(&PARTIES)?;
    Ok(Json(state.ride_service.get(session.kind(), id, ride_id).await?))
}

pub async fn transition(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath((ride_id, action)): ApiPath<(Uuid, String)>,
) -> AppResult<Json<Ride>> {
    let id = session.require_any(&PARTIES)?;
    let ride = state
        .ride_service
        .transition(session.kind(), id, ride_id, &action)
        .await?;
    Ok(Json(ride))
}

pub async fn tracking(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(ride_id): ApiPath<Uuid>,
) -> AppResult<Json<RideTracking>> {
    let id = session.require_any(&PARTIES)?;
    Ok(Json(
        state
            .ride_service
            .tracking(session.kind(), id, ride_id)
            .await?,
    ))
}
