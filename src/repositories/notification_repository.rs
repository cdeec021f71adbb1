use crate::error::RepositoryError;
use crate::models::{AccountKind, Notification};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for in-app notifications
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new NotificationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        recipient_kind: AccountKind,
        recipient_id: Uuid,
        title: &str,
        body: &str,
    ) -> Result<Notification, RepositoryError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (recipient_kind, recipient_id, title, body)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(recipient_kind.as_str())
        .bind(recipient_id)
        .bind(title)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    /// Newest first, capped at `limit`
    pub async fn list_for(
        &self,
        recipient_kind: AccountKind,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE recipient_kind = $1 AND recipient_id = $2
              AND ($3 = FALSE OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(recipient_kind.as_str())
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    /// Mark one of the recipient's notifications read
    pub async fn mark_read(
        &self,
        recipient_kind: AccountKind,
        recipient_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>, RepositoryError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND recipient_kind = $2 AND recipient_id = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(recipient_kind.as_str())
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }
}
