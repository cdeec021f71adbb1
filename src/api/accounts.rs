use super::extract::{ApiJson, Session};
use crate::error::{AppError, AppResult};
use crate::models::{
    Account, AccountKind, NewCustomer, NewDriver, NewRestaurant, NewRider, Registration,
};
use crate::services::{CourierStatus, LoginChallenge, SessionGrant};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub kind: AccountKind,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub kind: AccountKind,
    pub username: String,
    pub code: String,
}

fn parse_profile<T: DeserializeOwned>(body: Value) -> AppResult<T> {
    serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))
}

async fn register(
    state: &AppState,
    kind: AccountKind,
    body: Value,
) -> AppResult<(StatusCode, Json<Account>)> {
    let registration = match kind {
        AccountKind::Customer => Registration::Customer(parse_profile::<NewCustomer>(body)?),
        AccountKind::Restaurant => Registration::Restaurant(parse_profile::<NewRestaurant>(body)?),
        AccountKind::Driver => Registration::Driver(parse_profile::<NewDriver>(body)?),
        AccountKind::Rider => Registration::Rider(parse_profile::<NewRider>(body)?),
    };
    let account = state.account_service.register(&registration).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn register_customer(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<(StatusCode, Json<Account>)> {
    register(&state, AccountKind::Customer, body).await
}

pub async fn register_restaurant(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<(StatusCode, Json<Account>)> {
    register(&state, AccountKind::Restaurant, body).await
}

pub async fn register_driver(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<(StatusCode, Json<Account>)> {
    register(&state, AccountKind::Driver, body).await
}

pub async fn register_rider(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<(StatusCode, Json<Account>)> {
    register(&state, AccountKind::Rider, body).await
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginChallenge>> {
    let challenge = state
        .auth_service
        .login(req.kind, &req.username, &req.password)
        .await?;
    Ok(Json(challenge))
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> AppResult<Json<SessionGrant>> {
    let grant = state
        .auth_service
        .verify_otp(req.kind, &req.username, &req.code)
        .await?;
    Ok(Json(grant))
}

/// Claims of the current session
pub async fn me(session: Session) -> Json<crate::auth::SessionClaims> {
    Json(session.0)
}

pub async fn update_driver_status(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(status): ApiJson<CourierStatus>,
) -> AppResult<Json<Account>> {
    let id = session.require(AccountKind::Driver)?;
    let account = state
        .account_service
        .update_courier_status(AccountKind::Driver, id, &status)
        .await?;
    Ok(Json(account))
}

pub async fn update_rider_status(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(status): ApiJson<CourierStatus>,
) -> AppResult<Json<Account>> {
    let id = session.require(AccountKind::Rider)?;
    let account = state
        .account_service
        .update_courier_status(AccountKind::Rider, id, &status)
        .await?;
    Ok(Json(account))
}
