use async_trait::async_trait;
use uuid::Uuid;

use super::{DBClient, StoreError};
use crate::models::jobmodel::{NewReview, Review};

/// Recomputes `users.rating` for every id in `$1`. `ROUND(numeric, 1)` rounds
/// halves away from zero, matching `average_rating`.
pub(super) const REFRESH_RATINGS_SQL: &str = r#"
    UPDATE users u
    SET rating = COALESCE(
            (SELECT ROUND(AVG(r.rating)::numeric, 1)::float8
             FROM reviews r
             WHERE r.reviewed_user_id = u.id),
            0),
        updated_at = NOW()
    WHERE u.id = ANY($1)
"#;

#[async_trait]
pub trait ReviewExt: Send + Sync {
    /// Stores the review and recomputes the reviewed user's rating in one
    /// transaction, returning both. A second review by the same reviewer on
    /// the same job is a `UniqueViolation`.
    async fn create_review(&self, review: NewReview) -> Result<(Review, f64), StoreError>;

    async fn get_review_by_job_and_reviewer(
        &self,
        job_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<Option<Review>, StoreError>;

    /// Reviews received by the user, newest first.
    async fn get_user_reviews(&self, user_id: Uuid) -> Result<Vec<Review>, StoreError>;
}

#[async_trait]
impl ReviewExt for DBClient {
    async fn create_review(&self, review: NewReview) -> Result<(Review, f64), StoreError> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (job_id, reviewer_id, reviewed_user_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, job_id, reviewer_id, reviewed_user_id, rating, comment, created_at
            "#,
        )
        .bind(review.job_id)
        .bind(review.reviewer_id)
        .bind(review.reviewed_user_id)
        .bind(review.rating)
        .bind(review.comment)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!("{REFRESH_RATINGS_SQL} RETURNING u.rating");
        let rating = sqlx::query_scalar::<_, f64>(&query)
            .bind(vec![review.reviewed_user_id])
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                StoreError::MissingReference(format!("user {}", review.reviewed_user_id))
            })?;

        tx.commit().await?;

        Ok((review, rating))
    }

    async fn get_review_by_job_and_reviewer(
        &self,
        job_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<Option<Review>, StoreError> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, job_id, reviewer_id, reviewed_user_id, rating, comment, created_at
            FROM reviews
            WHERE job_id = $1 AND reviewer_id = $2
            "#,
        )
        .bind(job_id)
        .bind(reviewer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    async fn get_user_reviews(&self, user_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, job_id, reviewer_id, reviewed_user_id, rating, comment, created_at
            FROM reviews
            WHERE reviewed_user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }
}
