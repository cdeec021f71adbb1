use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// In-app notification for any account kind
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_kind: String,
    pub recipient_id: Uuid,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}
