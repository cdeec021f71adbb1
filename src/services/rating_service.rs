use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::{AccountKind, NewRating, OrderStatus, Rating, RideStatus, SubjectKind};
use crate::repositories::{OrderRepository, RatingRepository, RideRepository};
use crate::services::NotificationService;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for customer ratings
pub struct RatingService {
    rating_repo: Arc<RatingRepository>,
    order_repo: Arc<OrderRepository>,
    ride_repo: Arc<RideRepository>,
    notifications: Arc<NotificationService>,
}

impl RatingService {
    pub fn new(
        rating_repo: Arc<RatingRepository>,
        order_repo: Arc<OrderRepository>,
        ride_repo: Arc<RideRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            rating_repo,
            order_repo,
            ride_repo,
            notifications,
        }
    }

    /// Resolve who is being rated from the finished order or ride
    async fn resolve_target(&self, customer_id: Uuid, rating: &NewRating) -> AppResult<Uuid> {
        match rating.subject_kind {
            SubjectKind::Order => {
                let order = self
                    .order_repo
                    .find_by_id(rating.subject_id)
                    .await?
                    .filter(|o| o.customer_id == customer_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Order {} not found", rating.subject_id))
                    })?;
                if order.status_enum() != OrderStatus::Delivered {
                    return Err(AppError::Validation(
                        "Only delivered orders can be rated".to_string(),
                    ));
                }
                match rating.target_kind {
                    AccountKind::Restaurant => Ok(order.restaurant_id),
                    _ => order.rider_id.ok_or_else(|| {
                        AppError::Validation("Order has no rider to rate".to_string())
                    }),
                }
            }
            SubjectKind::Ride => {
                let ride = self
                    .ride_repo
                    .find_by_id(rating.subject_id)
                    .await?
                    .filter(|r| r.customer_id == customer_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Ride {} not found", rating.subject_id))
                    })?;
                if ride.status_enum() != RideStatus::Completed {
                    return Err(AppError::Validation(
                        "Only completed rides can be rated".to_string(),
                    ));
                }
                ride.driver_id
                    .ok_or_else(|| AppError::Validation("Ride has no driver to rate".to_string()))
            }
        }
    }

    /// Rate the restaurant or rider of a delivered order, or the driver of a
    /// completed ride
    pub async fn rate(&self, customer_id: Uuid, rating: &NewRating) -> AppResult<Rating> {
        rating.validate().map_err(AppError::Validation)?;
        let target_id = self.resolve_target(customer_id, rating).await?;

        let created = self
            .rating_repo
            .create(customer_id, target_id, rating)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => AppError::Conflict(format!(
                    "You already rated this {} for {} {}",
                    rating.target_kind,
                    rating.subject_kind.as_str(),
                    rating.subject_id
                )),
                other => other.into(),
            })?;

        info!(
            "Rating {}: {} {} scored {} by customer {}",
            created.id, rating.target_kind, target_id, created.score, customer_id
        );
        self.notifications
            .notify(
                rating.target_kind,
                target_id,
                "New rating",
                format!("You received {} out of 5", created.score),
            )
            .await;

        Ok(created)
    }

    pub async fn list_for_target(
        &self,
        target_kind: AccountKind,
        target_id: Uuid,
    ) -> AppResult<Vec<Rating>> {
        Ok(self.rating_repo.list_for_target(target_kind, target_id).await?)
    }
}
