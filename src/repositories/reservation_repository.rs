use super::{apply_transition, Assignee};
use crate::error::RepositoryError;
use crate::models::{AccountKind, NewReservation, Reservation, ReservationAction};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for table reservations
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    /// Create a new ReservationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending reservation
    pub async fn create(
        &self,
        customer_id: Uuid,
        reservation: &NewReservation,
    ) -> Result<Reservation, RepositoryError> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (customer_id, restaurant_id, party_size, reserved_for, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(reservation.restaurant_id)
        .bind(reservation.party_size)
        .bind(reservation.reserved_for)
        .bind(reservation.note.as_deref().map(str::trim))
        .fetch_one(&self.pool)
        .await?;
        Ok(reservation)
    }

    /// Find a reservation by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, RepositoryError> {
        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(reservation)
    }

    /// Reservations visible to a customer or a restaurant, soonest first
    pub async fn list_for(
        &self,
        kind: AccountKind,
        account_id: Uuid,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let column = match kind {
            AccountKind::Customer => "customer_id",
            AccountKind::Restaurant => "restaurant_id",
            _ => return Ok(Vec::new()),
        };
        let sql = format!(
            "SELECT * FROM reservations WHERE {} = $1 ORDER BY reserved_for ASC",
            column
        );
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reservations)
    }

    /// Persist a status transition
    pub async fn transition(
        &self,
        id: Uuid,
        action: ReservationAction,
    ) -> Result<Reservation, RepositoryError> {
        apply_transition(&self.pool, "reservations", id, action, Assignee::Untouched).await
    }
}
