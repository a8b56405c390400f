use async_trait::async_trait;
use uuid::Uuid;

use super::{reviewdb::REFRESH_RATINGS_SQL, DBClient, StoreError};
use crate::models::usermodel::{NewUser, ProfileUpdate, User};

#[async_trait]
pub trait UserExt: Send + Sync {
    async fn save_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError>;

    /// Removes the user and everything that would otherwise dangle:
    /// posted jobs with their applications, messages and reviews; the user's
    /// own applications, messages and reviews (written or received); the user's
    /// id in any applicant list. Jobs where the user was the selected worker
    /// return to `open`. Ratings of users whose reviews disappeared are
    /// recomputed. Returns `false` when the user does not exist.
    async fn delete_user_cascade(&self, user_id: Uuid) -> Result<bool, StoreError>;
}

const USER_COLUMNS: &str = "id, name, email, password, phone, location, skills, about, rating, created_at, updated_at";

#[async_trait]
impl UserExt for DBClient {
    async fn save_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            r#"
            INSERT INTO users (name, email, password, phone, location, skills)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.phone)
            .bind(user.location)
            .bind(user.skills)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");

        let users = sqlx::query_as::<_, User>(&query)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let query = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                location = COALESCE($4, location),
                skills = COALESCE($5, skills),
                about = COALESCE($6, about),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .bind(update.name)
            .bind(update.phone)
            .bind(update.location)
            .bind(update.skills)
            .bind(update.about)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn delete_user_cascade(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Ok(false);
        }

        // Reviews about other people that are about to disappear
        let affected: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT reviewed_user_id FROM reviews
            WHERE reviewed_user_id <> $1
              AND (reviewer_id = $1 OR job_id IN (SELECT id FROM jobs WHERE posted_by = $1))
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM reviews
            WHERE reviewer_id = $1 OR reviewed_user_id = $1
               OR job_id IN (SELECT id FROM jobs WHERE posted_by = $1)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM chat_messages
            WHERE sender_id = $1 OR job_id IN (SELECT id FROM jobs WHERE posted_by = $1)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM applications
            WHERE applicant_id = $1 OR job_id IN (SELECT id FROM jobs WHERE posted_by = $1)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM jobs WHERE posted_by = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let reopened = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'open'::job_status, selected_worker_id = NULL, updated_at = NOW()
            WHERE selected_worker_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            r#"
            UPDATE jobs
            SET applicants = array_remove(applicants, $1), updated_at = NOW()
            WHERE $1 = ANY(applicants)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if !affected.is_empty() {
            sqlx::query(REFRESH_RATINGS_SQL)
                .bind(affected.as_slice())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Deleted user {} ({} job(s) reopened, {} rating(s) recomputed)",
            user_id,
            reopened,
            affected.len()
        );

        Ok(true)
    }
}
