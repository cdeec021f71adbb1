pub mod account_service;
pub mod auth_service;
pub mod notification_service;
pub mod order_service;
pub mod rating_service;
pub mod reservation_service;
pub mod restaurant_service;
pub mod ride_service;

pub use account_service::{AccountService, CourierStatus};
pub use auth_service::{AuthService, LoginChallenge, SessionGrant};
pub use notification_service::NotificationService;
pub use order_service::{OrderService, OrderTracking};
pub use rating_service::RatingService;
pub use reservation_service::ReservationService;
pub use restaurant_service::{RestaurantDetail, RestaurantService};
pub use ride_service::{RideService, RideTracking};
