use super::{apply_transition, Assignee};
use crate::error::RepositoryError;
use crate::models::{AccountKind, Order, OrderAction, OrderItem, OrderStatus, OrderTotals, Status};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for food orders and their delivery
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new OrderRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending order with its priced line items
    pub async fn create(
        &self,
        customer_id: Uuid,
        restaurant_id: Uuid,
        items: &[OrderItem],
        totals: &OrderTotals,
        offer_code: Option<&str>,
        delivery_address: &str,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders
                (customer_id, restaurant_id, items, subtotal, discount, total, offer_code, delivery_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(restaurant_id)
        .bind(Json(items))
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.total)
        .bind(offer_code)
        .bind(delivery_address.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(order)
    }

    /// Find an order by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    /// Orders an account is party to, newest first
    pub async fn list_for(
        &self,
        kind: AccountKind,
        account_id: Uuid,
    ) -> Result<Vec<Order>, RepositoryError> {
        let column = match kind {
            AccountKind::Customer => "customer_id",
            AccountKind::Restaurant => "restaurant_id",
            AccountKind::Rider => "rider_id",
            AccountKind::Driver => return Ok(Vec::new()),
        };
        let sql = format!(
            "SELECT * FROM orders WHERE {} = $1 ORDER BY created_at DESC",
            column
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    /// Confirmed orders nobody has picked up yet, oldest first
    pub async fn list_available(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE status = $1 AND rider_id IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(OrderStatus::Confirmed.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Persist a status transition.
    ///
    /// Pickup claims the order for `actor_id`; deliver only succeeds for the
    /// rider holding it.
    pub async fn transition(
        &self,
        id: Uuid,
        action: OrderAction,
        actor_id: Uuid,
    ) -> Result<Order, RepositoryError> {
        let assignee = match action {
            OrderAction::Pickup => Assignee::Claim("rider_id", actor_id),
            OrderAction::Deliver => Assignee::Holder("rider_id", actor_id),
            _ => Assignee::Untouched,
        };
        apply_transition(&self.pool, "orders", id, action, assignee).await
    }
}
