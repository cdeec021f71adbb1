use chrono::NaiveDateTime;
use sqlx::FromRow;
use uuid::Uuid;

/// Wrong guesses allowed before a challenge is burned
pub const MAX_OTP_ATTEMPTS: i32 = 5;

/// Outstanding one-time password for an account
#[derive(Debug, Clone, FromRow)]
pub struct OtpChallenge {
    pub account_kind: String,
    pub account_id: Uuid,
    pub code_hash: String,
    pub attempts: i32,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}
