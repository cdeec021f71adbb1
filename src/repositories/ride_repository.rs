use super::{apply_transition, Assignee};
use crate::error::RepositoryError;
use crate::fare::FareEstimate;
use crate::models::{AccountKind, Ride, RideAction, RideQuote, RideStatus, Status};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Repository for ride requests. Driver availability moves with the ride.
pub struct RideRepository {
    pool: PgPool,
}

impl RideRepository {
    /// Create a new RideRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a requested ride.
    ///
    /// A customer with another open ride gets `Duplicate` from the partial
    /// unique index.
    pub async fn create(
        &self,
        customer_id: Uuid,
        quote: &RideQuote,
        estimate: &FareEstimate,
    ) -> Result<Ride, RepositoryError> {
        let ride = sqlx::query_as::<_, Ride>(
            r#"
            INSERT INTO rides
                (customer_id, pickup_latitude, pickup_longitude, pickup_address,
                 dropoff_latitude, dropoff_longitude, dropoff_address,
                 distance_km, duration_min, fare)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(quote.pickup.latitude)
        .bind(quote.pickup.longitude)
        .bind(quote.pickup.address.trim())
        .bind(quote.dropoff.latitude)
        .bind(quote.dropoff.longitude)
        .bind(quote.dropoff.address.trim())
        .bind(estimate.distance_km)
        .bind(estimate.duration_min)
        .bind(estimate.fare)
        .fetch_one(&self.pool)
        .await?;
        Ok(ride)
    }

    /// Find a ride by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Ride>, RepositoryError> {
        let ride = sqlx::query_as::<_, Ride>("SELECT * FROM rides WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ride)
    }

    /// The customer's open ride, if any
    pub async fn find_active_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<Ride>, RepositoryError> {
        let open: Vec<String> = [
            RideStatus::Requested,
            RideStatus::Accepted,
            RideStatus::InProgress,
        ]
        .iter()
        .map(|s| s.as_str().to_string())
        .collect();

        let ride = sqlx::query_as::<_, Ride>(
            "SELECT * FROM rides WHERE customer_id = $1 AND status = ANY($2) LIMIT 1",
        )
        .bind(customer_id)
        .bind(open)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ride)
    }

    /// Whether the driver holds an accepted or in-progress ride
    pub async fn driver_has_open_ride(&self, driver_id: Uuid) -> Result<bool, RepositoryError> {
        let open = vec![
            RideStatus::Accepted.as_str().to_string(),
            RideStatus::InProgress.as_str().to_string(),
        ];
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM rides WHERE driver_id = $1 AND status = ANY($2))",
        )
        .bind(driver_id)
        .bind(open)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Rides an account is party to, newest first
    pub async fn list_for(
        &self,
        kind: AccountKind,
        account_id: Uuid,
    ) -> Result<Vec<Ride>, RepositoryError> {
        let column = match kind {
            AccountKind::Customer => "customer_id",
            AccountKind::Driver => "driver_id",
            _ => return Ok(Vec::new()),
        };
        let sql = format!(
            "SELECT * FROM rides WHERE {} = $1 ORDER BY created_at DESC",
            column
        );
        let rides = sqlx::query_as::<_, Ride>(&sql)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rides)
    }

    /// Requested rides waiting for a driver, oldest first
    pub async fn list_available(&self) -> Result<Vec<Ride>, RepositoryError> {
        let rides = sqlx::query_as::<_, Ride>(
            r#"
            SELECT * FROM rides
            WHERE status = $1 AND driver_id IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(RideStatus::Requested.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rides)
    }

    /// Claim a requested ride for an available driver.
    ///
    /// The driver is marked unavailable in the same transaction; either both
    /// changes land or neither does.
    pub async fn accept(&self, id: Uuid, driver_id: Uuid) -> Result<Ride, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE drivers SET is_available = FALSE WHERE id = $1 AND is_available = TRUE",
        )
        .bind(driver_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if claimed == 0 {
            return Err(RepositoryError::StaleStatus(format!(
                "driver {} is not available",
                driver_id
            )));
        }

        let ride = apply_transition(
            &mut *tx,
            "rides",
            id,
            RideAction::Accept,
            Assignee::Claim("driver_id", driver_id),
        )
        .await?;

        tx.commit().await?;
        Ok(ride)
    }

    /// Persist start, complete or cancel.
    ///
    /// Driver actions only succeed for the assigned driver. Completing or
    /// cancelling frees the assigned driver.
    pub async fn transition(
        &self,
        id: Uuid,
        action: RideAction,
        actor_id: Uuid,
    ) -> Result<Ride, RepositoryError> {
        let assignee = match action {
            RideAction::Accept => return self.accept(id, actor_id).await,
            RideAction::CancelByCustomer => Assignee::Untouched,
            _ => Assignee::Holder("driver_id", actor_id),
        };

        let mut tx = self.pool.begin().await?;
        let ride: Ride = apply_transition(&mut *tx, "rides", id, action, assignee).await?;

        if ride.status_enum().is_terminal() {
            if let Some(driver_id) = ride.driver_id {
                release_driver(&mut *tx, driver_id).await?;
            }
        }

        tx.commit().await?;
        Ok(ride)
    }
}

async fn release_driver(conn: &mut PgConnection, driver_id: Uuid) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE drivers SET is_available = TRUE WHERE id = $1")
        .bind(driver_id)
        .execute(conn)
        .await?;
    Ok(())
}
