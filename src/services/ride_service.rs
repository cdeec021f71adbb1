use crate::error::{AppError, AppResult, RepositoryError};
use crate::fare::{FareCalculator, FareEstimate};
use crate::models::{AccountKind, Action, Ride, RideAction, RideQuote, RideStatus};
use crate::repositories::{AccountRepository, RideRepository};
use crate::services::order_service::CourierPosition;
use crate::services::NotificationService;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct RideTracking {
    pub ride_id: Uuid,
    pub status: RideStatus,
    pub driver: Option<CourierPosition>,
    pub updated_at: NaiveDateTime,
}

fn resolve_action(name: &str, kind: AccountKind) -> AppResult<RideAction> {
    let action = match (name, kind) {
        ("accept", _) => RideAction::Accept,
        ("start", _) => RideAction::Start,
        ("complete", _) => RideAction::Complete,
        ("cancel", AccountKind::Driver) => RideAction::CancelByDriver,
        ("cancel", _) => RideAction::CancelByCustomer,
        _ => return Err(AppError::NotFound(format!("Unknown ride action: {}", name))),
    };
    if action.actor() != kind {
        return Err(AppError::Forbidden(format!(
            "Only a {} can {} a ride",
            action.actor(),
            action.name()
        )));
    }
    Ok(action)
}

/// Service for ride requests
pub struct RideService {
    ride_repo: Arc<RideRepository>,
    account_repo: Arc<AccountRepository>,
    notifications: Arc<NotificationService>,
    fares: FareCalculator,
}

impl RideService {
    pub fn new(
        ride_repo: Arc<RideRepository>,
        account_repo: Arc<AccountRepository>,
        notifications: Arc<NotificationService>,
        fares: FareCalculator,
    ) -> Self {
        Self {
            ride_repo,
            account_repo,
            notifications,
            fares,
        }
    }

    pub fn estimate(&self, quote: &RideQuote) -> AppResult<FareEstimate> {
        quote.validate().map_err(AppError::Validation)?;
        Ok(self
            .fares
            .estimate(quote.pickup.location(), quote.dropoff.location()))
    }

    /// Request a ride at the estimated fare
    pub async fn request(&self, customer_id: Uuid, quote: &RideQuote) -> AppResult<Ride> {
        let estimate = self.estimate(quote)?;

        let open_ride = || AppError::Conflict("You already have an open ride".to_string());
        if self
            .ride_repo
            .find_active_for_customer(customer_id)
            .await?
            .is_some()
        {
            return Err(open_ride());
        }

        let ride = self
            .ride_repo
            .create(customer_id, quote, &estimate)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => open_ride(),
                other => other.into(),
            })?;

        info!(
            "Ride {} requested: customer={}, distance={}km, fare={}",
            ride.id, customer_id, ride.distance_km, ride.fare
        );
        Ok(ride)
    }

    pub async fn list(&self, kind: AccountKind, account_id: Uuid) -> AppResult<Vec<Ride>> {
        Ok(self.ride_repo.list_for(kind, account_id).await?)
    }

    /// Requested rides waiting for a driver
    pub async fn available(&self) -> AppResult<Vec<Ride>> {
        Ok(self.ride_repo.list_available().await?)
    }

    /// Load a ride visible to the caller. Drivers may also see open requests.
    pub async fn get(&self, kind: AccountKind, account_id: Uuid, ride_id: Uuid) -> AppResult<Ride> {
        self.ride_repo
            .find_by_id(ride_id)
            .await?
            .filter(|r| {
                r.involves(kind, account_id)
                    || (kind == AccountKind::Driver
                        && r.driver_id.is_none()
                        && r.status_enum() == RideStatus::Requested)
            })
            .ok_or_else(|| AppError::NotFound(format!("Ride {} not found", ride_id)))
    }

    /// Apply a named action on behalf of `kind`/`actor_id`
    pub async fn transition(
        &self,
        kind: AccountKind,
        actor_id: Uuid,
        ride_id: Uuid,
        action_name: &str,
    ) -> AppResult<Ride> {
        let action = resolve_action(action_name, kind)?;
        let ride = self.get(kind, actor_id, ride_id).await?;

        action.apply(ride.status_enum())?;
        let updated = self.ride_repo.transition(ride_id, action, actor_id).await?;

        info!(
            "Ride {}: {} -> {} by {} {}",
            ride_id, ride.status, updated.status, kind, actor_id
        );

        let body = format!("Ride {} is now {}", updated.id, updated.status);
        match (kind, updated.driver_id) {
            (AccountKind::Customer, Some(driver_id)) => {
                self.notifications
                    .notify(AccountKind::Driver, driver_id, "Ride update", body)
                    .await
            }
            (AccountKind::Driver, _) => {
                self.notifications
                    .notify(AccountKind::Customer, updated.customer_id, "Ride update", body)
                    .await
            }
            _ => {}
        }

        Ok(updated)
    }

    /// Status and the driver's last known position
    pub async fn tracking(
        &self,
        kind: AccountKind,
        account_id: Uuid,
        ride_id: Uuid,
    ) -> AppResult<RideTracking> {
        let ride = self.get(kind, account_id, ride_id).await?;
        let driver = match ride.driver_id {
            Some(driver_id) => self
                .account_repo
                .find_driver(driver_id)
                .await?
                .map(|d| CourierPosition {
                    id: d.id,
                    name: d.full_name,
                    phone: d.phone,
                    latitude: d.latitude,
                    longitude: d.longitude,
                }),
            None => None,
        };

        Ok(RideTracking {
            ride_id: ride.id,
            status: ride.status_enum(),
            driver,
            updated_at: ride.updated_at,
        })
    }
}
