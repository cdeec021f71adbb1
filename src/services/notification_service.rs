use crate::error::{AppError, AppResult};
use crate::models::{AccountKind, Notification};
use crate::repositories::NotificationRepository;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

const LIST_LIMIT: i64 = 100;

/// In-app notification sink
pub struct NotificationService {
    notification_repo: Arc<NotificationRepository>,
}

impl NotificationService {
    pub fn new(notification_repo: Arc<NotificationRepository>) -> Self {
        Self { notification_repo }
    }

    /// Best-effort: a failed insert is logged and otherwise ignored
    pub async fn notify(&self, kind: AccountKind, recipient_id: Uuid, title: &str, body: String) {
        match self
            .notification_repo
            .create(kind, recipient_id, title, &body)
            .await
        {
            Ok(n) => debug!("Notified {} {}: {} ({})", kind, recipient_id, title, n.id),
            Err(e) => warn!(
                "Failed to notify {} {} ({}): {}",
                kind, recipient_id, title, e
            ),
        }
    }

    pub async fn list(
        &self,
        kind: AccountKind,
        recipient_id: Uuid,
        unread_only: bool,
    ) -> AppResult<Vec<Notification>> {
        Ok(self
            .notification_repo
            .list_for(kind, recipient_id, unread_only, LIST_LIMIT)
            .await?)
    }

    /// Mark one of the caller's own notifications as read
    pub async fn mark_read(
        &self,
        kind: AccountKind,
        recipient_id: Uuid,
        id: Uuid,
    ) -> AppResult<Notification> {
        self.notification_repo
            .mark_read(kind, recipient_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
    }
}
