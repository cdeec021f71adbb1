pub mod account_repository;
pub mod notification_repository;
pub mod order_repository;
pub mod otp_repository;
pub mod rating_repository;
pub mod reservation_repository;
pub mod restaurant_repository;
pub mod ride_repository;

// Re-export all repositories for convenient access
pub use account_repository::AccountRepository;
pub use notification_repository::NotificationRepository;
pub use order_repository::OrderRepository;
pub use otp_repository::OtpRepository;
pub use rating_repository::RatingRepository;
pub use reservation_repository::ReservationRepository;
pub use restaurant_repository::RestaurantRepository;
pub use ride_repository::RideRepository;

use crate::error::RepositoryError;
use crate::models::{Action, Status};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// How a transition touches the assignee column (`rider_id`, `driver_id`)
#[derive(Debug, Clone, Copy)]
pub(crate) enum Assignee {
    /// Leave the column alone
    Untouched,
    /// Set the column; only succeeds while it is still NULL
    Claim(&'static str, Uuid),
    /// Only succeeds if the column already holds this id
    Holder(&'static str, Uuid),
}

/// Persist `action` as a single compare-and-set update.
///
/// The row only changes if its current status is one of the action's
/// `from_states` (and the assignee condition holds), so concurrent callers
/// racing for the same record cannot both succeed. The loser gets
/// `RepositoryError::StaleStatus`.
pub(crate) async fn apply_transition<'e, T, A, E>(
    executor: E,
    table: &'static str,
    id: Uuid,
    action: A,
    assignee: Assignee,
) -> Result<T, RepositoryError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    A: Action,
    E: PgExecutor<'e>,
{
    let (set_assignee, guard) = match assignee {
        Assignee::Untouched => (String::new(), String::new()),
        Assignee::Claim(column, _) => (
            format!(", {column} = $4"),
            format!(" AND {column} IS NULL"),
        ),
        Assignee::Holder(column, _) => (String::new(), format!(" AND {column} = $4")),
    };

    let sql = format!(
        "UPDATE {table} SET status = $2, updated_at = NOW(){set_assignee} \
         WHERE id = $1 AND status = ANY($3){guard} RETURNING *"
    );

    let mut query = sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .bind(action.target().as_str())
        .bind(action.from_state_strs());
    if let Assignee::Claim(_, assignee_id) | Assignee::Holder(_, assignee_id) = assignee {
        query = query.bind(assignee_id);
    }

    query.fetch_optional(executor).await?.ok_or_else(|| {
        RepositoryError::StaleStatus(format!(
            "{} {} changed before it could {}",
            <A::State as Status>::ENTITY,
            id,
            action.name()
        ))
    })
}
