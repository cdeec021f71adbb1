//! HTTP surface.
//!
//! Everything except `/health` lives under `/api`. Errors are rendered by
//! `AppError` as `{ "error": message }`.

pub mod accounts;
pub mod extract;
pub mod notifications;
pub mod orders;
pub mod ratings;
pub mod reservations;
pub mod restaurants;
pub mod rides;

pub use extract::Session;

use crate::AppState;
use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use http::{header, Method, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Liveness plus a database round trip
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.database.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up" })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "down" })),
            )
        }
    }
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Accounts and auth
        .route("/customers/register", post(accounts::register_customer))
        .route("/restaurants/register", post(accounts::register_restaurant))
        .route("/drivers/register", post(accounts::register_driver))
        .route("/riders/register", post(accounts::register_rider))
        .route("/auth/login", post(accounts::login))
        .route("/auth/verify-otp", post(accounts::verify_otp))
        .route("/auth/me", get(accounts::me))
        .route("/drivers/me/status", put(accounts::update_driver_status))
        .route("/riders/me/status", put(accounts::update_rider_status))
        // Restaurants, menu and offers
        .route("/restaurants", get(restaurants::list))
        .route("/restaurants/me", put(restaurants::update_profile))
        .route("/restaurants/me/menu", post(restaurants::add_menu_item))
        .route(
            "/restaurants/me/menu/:item_id",
            put(restaurants::update_menu_item).delete(restaurants::remove_menu_item),
        )
        .route("/restaurants/me/offers", post(restaurants::create_offer))
        .route(
            "/restaurants/me/offers/:offer_id",
            axum::routing::delete(restaurants::deactivate_offer),
        )
        .route("/restaurants/:id", get(restaurants::get))
        // Reservations
        .route(
            "/reservations",
            post(reservations::create).get(reservations::list),
        )
        .route("/reservations/:id/:action", post(reservations::transition))
        // Orders and deliveries
        .route("/orders", post(orders::place).get(orders::list))
        .route("/orders/:id", get(orders::get))
        .route("/orders/:id/tracking", get(orders::tracking))
        .route("/orders/:id/:action", post(orders::transition))
        .route("/deliveries/available", get(orders::available_deliveries))
        // Rides
        .route("/rides/estimate", post(rides::estimate))
        .route("/rides", post(rides::request).get(rides::list))
        .route("/rides/available", get(rides::available))
        .route("/rides/:id", get(rides::get))
        .route("/rides/:id/tracking", get(rides::tracking))
        .route("/rides/:id/:action", post(rides::transition))
        // Ratings
        .route("/ratings", post(ratings::rate))
        .route("/ratings/:target_kind/:target_id", get(ratings::list_for_target))
        // Notifications
        .route("/notifications", get(notifications::list))
        .route("/notifications/:id/read", post(notifications::mark_read))
}

/// Build the application router with CORS and request tracing
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Route not found" })),
            )
        })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
