use crate::auth::hash_password;
use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::{Account, AccountKind, Location, Registration};
use crate::repositories::{AccountRepository, RideRepository};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Availability and position reported by a driver or rider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourierStatus {
    pub is_available: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CourierStatus {
    /// Both coordinates or neither
    pub fn location(&self) -> Result<Option<Location>, String> {
        match (self.latitude, self.longitude) {
            (None, None) => Ok(None),
            (Some(latitude), Some(longitude)) => {
                let location = Location {
                    latitude,
                    longitude,
                };
                location.validate()?;
                Ok(Some(location))
            }
            _ => Err("latitude and longitude must be given together".to_string()),
        }
    }
}

/// Service for registration and account profiles
pub struct AccountService {
    account_repo: Arc<AccountRepository>,
    ride_repo: Arc<RideRepository>,
}

impl AccountService {
    pub fn new(account_repo: Arc<AccountRepository>, ride_repo: Arc<RideRepository>) -> Self {
        Self {
            account_repo,
            ride_repo,
        }
    }

    /// Register a new account of `registration.kind()`
    pub async fn register(&self, registration: &Registration) -> AppResult<Account> {
        let kind = registration.kind();
        info!("Registering {}: {}", kind, registration.username());

        registration.validate().map_err(AppError::Validation)?;

        if self
            .account_repo
            .username_exists(kind, registration.username())
            .await?
        {
            return Err(AppError::Conflict(format!(
                "Username {} is already taken",
                registration.username()
            )));
        }

        let password_hash = hash_password(registration.password());
        let account = self
            .account_repo
            .create(registration, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => AppError::Conflict(format!(
                    "Username {} is already taken",
                    registration.username()
                )),
                other => other.into(),
            })?;

        info!("Registered {} {}", kind, account.id());
        Ok(account)
    }

    /// Load an account, 404 if it no longer exists
    pub async fn get(&self, kind: AccountKind, id: Uuid) -> AppResult<Account> {
        self.account_repo
            .find_account(kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", kind, id)))
    }

    /// Update a driver's or rider's availability and position
    pub async fn update_courier_status(
        &self,
        kind: AccountKind,
        id: Uuid,
        status: &CourierStatus,
    ) -> AppResult<Account> {
        let location = status.location().map_err(AppError::Validation)?;

        // A driver on a ride is released when it ends, not by hand
        if kind == AccountKind::Driver
            && status.is_available == Some(true)
            && self.ride_repo.driver_has_open_ride(id).await?
        {
            return Err(AppError::Conflict(
                "Cannot become available during a ride".to_string(),
            ));
        }

        let found = self
            .account_repo
            .update_courier_status(kind, id, status.is_available, location)
            .await?;
        if !found {
            return Err(AppError::NotFound(format!("{} {} not found", kind, id)));
        }

        info!(
            "{} {} status: available={:?}, located={}",
            kind,
            id,
            status.is_available,
            location.is_some()
        );
        self.get(kind, id).await
    }
}
