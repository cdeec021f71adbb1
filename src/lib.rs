//! Feastride Backend Library
//!
//! REST backend for a food-delivery and ride-hailing marketplace. This module
//! exposes the components for use by the binary and by tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod fare;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use api::router;
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use auth::SessionCodec;
use database::Database;
use fare::FareCalculator;
use repositories::*;
use services::*;
use std::sync::Arc;

/// Application state containing all repositories and services
pub struct AppState {
    pub database: Database,
    pub account_repo: Arc<AccountRepository>,
    pub restaurant_repo: Arc<RestaurantRepository>,
    pub reservation_repo: Arc<ReservationRepository>,
    pub order_repo: Arc<OrderRepository>,
    pub ride_repo: Arc<RideRepository>,
    pub rating_repo: Arc<RatingRepository>,
    pub notification_repo: Arc<NotificationRepository>,
    pub otp_repo: Arc<OtpRepository>,
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub restaurant_service: RestaurantService,
    pub reservation_service: ReservationService,
    pub order_service: OrderService,
    pub ride_service: RideService,
    pub rating_service: RatingService,
    pub notification_service: Arc<NotificationService>,
}

impl AppState {
    /// Create a new AppState with initialized repositories and services
    pub fn new(pool: sqlx::PgPool, config: &AppConfig) -> Self {
        let database = Database::new(pool.clone());

        let account_repo = Arc::new(AccountRepository::new(pool.clone()));
        let restaurant_repo = Arc::new(RestaurantRepository::new(pool.clone()));
        let reservation_repo = Arc::new(ReservationRepository::new(pool.clone()));
        let order_repo = Arc::new(OrderRepository::new(pool.clone()));
        let ride_repo = Arc::new(RideRepository::new(pool.clone()));
        let rating_repo = Arc::new(RatingRepository::new(pool.clone()));
        let notification_repo = Arc::new(NotificationRepository::new(pool.clone()));
        let otp_repo = Arc::new(OtpRepository::new(pool));

        let notification_service = Arc::new(NotificationService::new(notification_repo.clone()));
        let sessions = SessionCodec::new(&config.auth.session_secret, config.auth.session_ttl_secs);

        Self {
            database,
            account_service: AccountService::new(account_repo.clone(), ride_repo.clone()),
            auth_service: AuthService::new(
                account_repo.clone(),
                otp_repo.clone(),
                sessions,
                config.auth.clone(),
            ),
            restaurant_service: RestaurantService::new(
                restaurant_repo.clone(),
                account_repo.clone(),
            ),
            reservation_service: ReservationService::new(
                reservation_repo.clone(),
                account_repo.clone(),
                notification_service.clone(),
            ),
            order_service: OrderService::new(
                order_repo.clone(),
                restaurant_repo.clone(),
                account_repo.clone(),
                notification_service.clone(),
            ),
            ride_service: RideService::new(
                ride_repo.clone(),
                account_repo.clone(),
                notification_service.clone(),
                FareCalculator::new(config.fare.clone()),
            ),
            rating_service: RatingService::new(
                rating_repo.clone(),
                order_repo.clone(),
                ride_repo.clone(),
                notification_service.clone(),
            ),
            notification_service,
            account_repo,
            restaurant_repo,
            reservation_repo,
            order_repo,
            ride_repo,
            rating_repo,
            notification_repo,
            otp_repo,
        }
    }
}
