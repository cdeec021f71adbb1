use crate::error::RepositoryError;
use crate::models::{AccountKind, OtpChallenge};
use chrono::NaiveDateTime;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for outstanding login challenges
pub struct OtpRepository {
    pool: PgPool,
}

impl OtpRepository {
    /// Create a new OtpRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a challenge, replacing any previous one for the account
    pub async fn upsert(
        &self,
        kind: AccountKind,
        account_id: Uuid,
        code_hash: &str,
        expires_at: NaiveDateTime,
    ) -> Result<OtpChallenge, RepositoryError> {
        let challenge = sqlx::query_as::<_, OtpChallenge>(
            r#"
            INSERT INTO otp_challenges (account_kind, account_id, code_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (account_kind, account_id) DO UPDATE
            SET code_hash = EXCLUDED.code_hash,
                attempts = 0,
                expires_at = EXCLUDED.expires_at,
                created_at = NOW()
            RETURNING *
            "#,
        )
        .bind(kind.as_str())
        .bind(account_id)
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(challenge)
    }

    /// The outstanding challenge for an account, if any
    pub async fn find(
        &self,
        kind: AccountKind,
        account_id: Uuid,
    ) -> Result<Option<OtpChallenge>, RepositoryError> {
        let challenge = sqlx::query_as::<_, OtpChallenge>(
            "SELECT * FROM otp_challenges WHERE account_kind = $1 AND account_id = $2",
        )
        .bind(kind.as_str())
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(challenge)
    }

    /// Spend one attempt on the live challenge before any comparison.
    ///
    /// Returns the stored hash and the new attempt count, or `None` when the
    /// challenge is missing, expired, or out of attempts. Concurrent guesses
    /// can never spend more than `max_attempts` between them.
    pub async fn reserve_attempt(
        &self,
        kind: AccountKind,
        account_id: Uuid,
        max_attempts: i32,
    ) -> Result<Option<(String, i32)>, RepositoryError> {
        let reserved = sqlx::query_as::<_, (String, i32)>(
            r#"
            UPDATE otp_challenges SET attempts = attempts + 1
            WHERE account_kind = $1 AND account_id = $2
              AND attempts < $3 AND expires_at > NOW()
            RETURNING code_hash, attempts
            "#,
        )
        .bind(kind.as_str())
        .bind(account_id)
        .bind(max_attempts)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reserved)
    }

    /// Delete the challenge if it still holds `code_hash` within budget.
    ///
    /// Returns false when another request already consumed or replaced it,
    /// which makes each code single-use.
    pub async fn consume(
        &self,
        kind: AccountKind,
        account_id: Uuid,
        code_hash: &str,
        max_attempts: i32,
    ) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM otp_challenges
            WHERE account_kind = $1 AND account_id = $2 AND code_hash = $3
              AND attempts <= $4 AND expires_at > NOW()
            "#,
        )
        .bind(kind.as_str())
        .bind(account_id)
        .bind(code_hash)
        .bind(max_attempts)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows_affected > 0)
    }

    /// Drop a challenge that can no longer be used, unless a newer login
    /// already replaced it
    pub async fn discard(
        &self,
        kind: AccountKind,
        account_id: Uuid,
        code_hash: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "DELETE FROM otp_challenges WHERE account_kind = $1 AND account_id = $2 AND code_hash = $3",
        )
        .bind(kind.as_str())
        .bind(account_id)
        .bind(code_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete every expired challenge, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let rows_affected = sqlx::query("DELETE FROM otp_challenges WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected)
    }
}
