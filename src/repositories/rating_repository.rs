use crate::error::RepositoryError;
use crate::models::{AccountKind, NewRating, Rating};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for ratings and the running averages they feed
pub struct RatingRepository {
    pool: PgPool,
}

impl RatingRepository {
    /// Create a new RatingRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a rating and fold it into the target's average.
    ///
    /// Both writes share one transaction. Rating the same target twice for
    /// the same subject is a `Duplicate`.
    pub async fn create(
        &self,
        rater_id: Uuid,
        target_id: Uuid,
        rating: &NewRating,
    ) -> Result<Rating, RepositoryError> {
        if rating.target_kind == AccountKind::Customer {
            return Err(RepositoryError::ConstraintViolation(
                "customers cannot be rated".to_string(),
            ));
        }

        let table = rating.target_kind.table();
        let mut tx = self.pool.begin().await?;

        // One rating per target at a time
        let locked = sqlx::query(&format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", table))
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound(format!(
                "{} {}",
                rating.target_kind, target_id
            )));
        }

        let created = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings
                (rater_id, subject_kind, subject_id, target_kind, target_id, score, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(rater_id)
        .bind(rating.subject_kind.as_str())
        .bind(rating.subject_id)
        .bind(rating.target_kind.as_str())
        .bind(target_id)
        .bind(rating.score)
        .bind(rating.comment.as_deref().map(str::trim))
        .fetch_one(&mut *tx)
        .await?;

        // Recount from the stored scores
        let sql = format!(
            r#"
            UPDATE {table} t
            SET rating_avg = s.avg_score, rating_count = s.total
            FROM (
                SELECT ROUND(AVG(score)::NUMERIC, 2) AS avg_score, COUNT(*)::INT AS total
                FROM ratings
                WHERE target_kind = $2 AND target_id = $1
            ) s
            WHERE t.id = $1
            "#
        );
        sqlx::query(&sql)
            .bind(target_id)
            .bind(rating.target_kind.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Ratings received by an account, newest first
    pub async fn list_for_target(
        &self,
        target_kind: AccountKind,
        target_id: Uuid,
    ) -> Result<Vec<Rating>, RepositoryError> {
        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT * FROM ratings
            WHERE target_kind = $1 AND target_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(target_kind.as_str())
        .bind(target_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }
}
