use async_trait::async_trait;
use uuid::Uuid;

use super::{reviewdb::REFRESH_RATINGS_SQL, DBClient, StoreError};
use crate::models::jobmodel::{Job, JobDetailsUpdate, JobFilter, JobStatus, NewJob};

#[async_trait]
pub trait JobExt: Send + Sync {
    async fn create_job(&self, posted_by: Uuid, job: NewJob) -> Result<Job, StoreError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError>;

    async fn get_open_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError>;

    async fn get_jobs_by_poster(&self, user_id: Uuid) -> Result<Vec<Job>, StoreError>;

    async fn get_jobs_by_ids(&self, job_ids: &[Uuid]) -> Result<Vec<Job>, StoreError>;

    /// Applies content edits while the job is still `open`. `None` when the
    /// job is missing or no longer open.
    async fn update_job_details(
        &self,
        job_id: Uuid,
        update: JobDetailsUpdate,
    ) -> Result<Option<Job>, StoreError>;

    /// `open -> assigned` with `worker_id` as selected worker, only if the job
    /// is still open and `worker_id` is among its applicants.
    async fn assign_worker(&self, job_id: Uuid, worker_id: Uuid) -> Result<Option<Job>, StoreError>;

    /// Conditional status change; `None` when the job is not in `from`.
    async fn transition_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError>;

    /// Deletes the job with its applications, messages and reviews and
    /// recomputes ratings touched by the removed reviews.
    async fn delete_job_cascade(&self, job_id: Uuid) -> Result<bool, StoreError>;
}

const JOB_COLUMNS: &str = "id, title, description, location, payment, category, urgency_flag, \
    posted_by, status, applicants, selected_worker_id, created_at, updated_at";

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(&self, posted_by: Uuid, job: NewJob) -> Result<Job, StoreError> {
        let query = format!(
            r#"
            INSERT INTO jobs (title, description, location, payment, category, urgency_flag, posted_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {JOB_COLUMNS}
            "#
        );

        let job = sqlx::query_as::<_, Job>(&query)
            .bind(job.title)
            .bind(job.description)
            .bind(job.location)
            .bind(job.payment)
            .bind(job.category)
            .bind(job.urgency_flag)
            .bind(posted_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");

        let job = sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn get_open_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        let query = format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE status = 'open'::job_status
              AND ($1::text IS NULL OR LOWER(category) = LOWER($1))
              AND ($2::text IS NULL OR location ILIKE '%' || $2 || '%')
              AND (NOT $3 OR urgency_flag)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        );

        let jobs = sqlx::query_as::<_, Job>(&query)
            .bind(filter.category.as_deref())
            .bind(filter.location.as_deref())
            .bind(filter.urgent_only)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }

    async fn get_jobs_by_poster(&self, user_id: Uuid) -> Result<Vec<Job>, StoreError> {
        let query = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE posted_by = $1 ORDER BY created_at DESC"
        );

        let jobs = sqlx::query_as::<_, Job>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }

    async fn get_jobs_by_ids(&self, job_ids: &[Uuid]) -> Result<Vec<Job>, StoreError> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ANY($1)");

        let jobs = sqlx::query_as::<_, Job>(&query)
            .bind(job_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }

    async fn update_job_details(
        &self,
        job_id: Uuid,
        update: JobDetailsUpdate,
    ) -> Result<Option<Job>, StoreError> {
        let query = format!(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                payment = COALESCE($5, payment),
                category = COALESCE($6, category),
                urgency_flag = COALESCE($7, urgency_flag),
                updated_at = NOW()
            WHERE id = $1 AND status = 'open'::job_status
            RETURNING {JOB_COLUMNS}
            "#
        );

        let job = sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(update.title)
            .bind(update.description)
            .bind(update.location)
            .bind(update.payment)
            .bind(update.category)
            .bind(update.urgency_flag)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn assign_worker(&self, job_id: Uuid, worker_id: Uuid) -> Result<Option<Job>, StoreError> {
        let query = format!(
            r#"
            UPDATE jobs
            SET selected_worker_id = $2, status = 'assigned'::job_status, updated_at = NOW()
            WHERE id = $1 AND status = 'open'::job_status AND $2 = ANY(applicants)
            RETURNING {JOB_COLUMNS}
            "#
        );

        let job = sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(worker_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn transition_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError> {
        let query = format!(
            r#"
            UPDATE jobs
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {JOB_COLUMNS}
            "#
        );

        let job = sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn delete_job_cascade(&self, job_id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Ok(false);
        }

        let reviewed: Vec<Uuid> = sqlx::query_scalar(
            "SELECT DISTINCT reviewed_user_id FROM reviews WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM reviews WHERE job_id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM chat_messages WHERE job_id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM applications WHERE job_id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        if !reviewed.is_empty() {
            sqlx::query(REFRESH_RATINGS_SQL)
                .bind(reviewed.as_slice())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(true)
    }
}
