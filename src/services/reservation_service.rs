use crate::error::{AppError, AppResult};
use crate::models::{AccountKind, Action, NewReservation, Reservation, ReservationAction};
use crate::repositories::{AccountRepository, ReservationRepository};
use crate::services::NotificationService;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for table reservations
pub struct ReservationService {
    reservation_repo: Arc<ReservationRepository>,
    account_repo: Arc<AccountRepository>,
    notifications: Arc<NotificationService>,
}

impl ReservationService {
    pub fn new(
        reservation_repo: Arc<ReservationRepository>,
        account_repo: Arc<AccountRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            reservation_repo,
            account_repo,
            notifications,
        }
    }

    /// Book a table for a customer
    pub async fn create(
        &self,
        customer_id: Uuid,
        reservation: &NewReservation,
    ) -> AppResult<Reservation> {
        reservation
            .validate(Utc::now().naive_utc())
            .map_err(AppError::Validation)?;

        let restaurant = self
            .account_repo
            .find_restaurant(reservation.restaurant_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Restaurant {} not found",
                    reservation.restaurant_id
                ))
            })?;

        let created = self.reservation_repo.create(customer_id, reservation).await?;
        info!(
            "Reservation {} created: customer={}, restaurant={}, party={}",
            created.id, customer_id, restaurant.id, created.party_size
        );

        self.notifications
            .notify(
                AccountKind::Restaurant,
                restaurant.id,
                "New reservation",
                format!(
                    "Table for {} on {}",
                    created.party_size,
                    created.reserved_for.format("%Y-%m-%d %H:%M")
                ),
            )
            .await;

        Ok(created)
    }

    pub async fn list(&self, kind: AccountKind, account_id: Uuid) -> AppResult<Vec<Reservation>> {
        Ok(self.reservation_repo.list_for(kind, account_id).await?)
    }

    /// Apply a named action on behalf of `kind`/`actor_id`
    pub async fn transition(
        &self,
        kind: AccountKind,
        actor_id: Uuid,
        reservation_id: Uuid,
        action_name: &str,
    ) -> AppResult<Reservation> {
        let action = ReservationAction::from_name(action_name).ok_or_else(|| {
            AppError::NotFound(format!("Unknown reservation action: {}", action_name))
        })?;
        if action.actor() != kind {
            return Err(AppError::Forbidden(format!(
                "Only a {} can {} a reservation",
                action.actor(),
                action.name()
            )));
        }

        let reservation = self
            .reservation_repo
            .find_by_id(reservation_id)
            .await?
            .filter(|r| match kind {
                AccountKind::Customer => r.customer_id == actor_id,
                AccountKind::Restaurant => r.restaurant_id == actor_id,
                _ => false,
            })
            .ok_or_else(|| {
                AppError::NotFound(format!("Reservation {} not found", reservation_id))
            })?;

        action.apply(reservation.status_enum())?;
        let updated = self.reservation_repo.transition(reservation_id, action).await?;

        info!(
            "Reservation {}: {} -> {}",
            reservation_id, reservation.status, updated.status
        );

        let (recipient_kind, recipient_id) = match kind {
            AccountKind::Customer => (AccountKind::Restaurant, updated.restaurant_id),
            _ => (AccountKind::Customer, updated.customer_id),
        };
        self.notifications
            .notify(
                recipient_kind,
                recipient_id,
                "Reservation update",
                format!(
                    "Reservation for {} is now {}",
                    updated.reserved_for.format("%Y-%m-%d %H:%M"),
                    updated.status
                ),
            )
            .await;

        Ok(updated)
    }
}
