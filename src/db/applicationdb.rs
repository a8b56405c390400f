use async_trait::async_trait;
use uuid::Uuid;

use super::{DBClient, StoreError};
use crate::models::jobmodel::{Application, ApplicationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawOutcome {
    Withdrawn,
    NotFound,
    /// The applicant is the job's selected worker and cannot leave the applicant list.
    SelectedWorker,
}

#[async_trait]
pub trait ApplicationExt: Send + Sync {
    /// Creates a `pending` application and appends the applicant to the job's
    /// applicant list in one unit. A second application for the same pair is a
    /// `UniqueViolation`; a missing job is a `MissingReference`.
    async fn create_application(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
    ) -> Result<Application, StoreError>;

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, StoreError>;

    async fn get_job_applications(&self, job_id: Uuid) -> Result<Vec<Application>, StoreError>;

    async fn get_applications_by_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<Application>, StoreError>;

    async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, StoreError>;

    /// Deletes the application and removes the applicant from the job's list.
    async fn withdraw_application(&self, application_id: Uuid) -> Result<WithdrawOutcome, StoreError>;
}

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, status, created_at";

#[async_trait]
impl ApplicationExt for DBClient {
    async fn create_application(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
    ) -> Result<Application, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO applications (job_id, applicant_id)
            VALUES ($1, $2)
            RETURNING {APPLICATION_COLUMNS}
            "#
        );

        let application = sqlx::query_as::<_, Application>(&query)
            .bind(job_id)
            .bind(applicant_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE jobs
            SET applicants = array_append(applicants, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(applicants))
            "#,
        )
        .bind(job_id)
        .bind(applicant_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(application)
    }

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, StoreError> {
        let query = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");

        let application = sqlx::query_as::<_, Application>(&query)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(application)
    }

    async fn get_job_applications(&self, job_id: Uuid) -> Result<Vec<Application>, StoreError> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 ORDER BY created_at ASC"
        );

        let applications = sqlx::query_as::<_, Application>(&query)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(applications)
    }

    async fn get_applications_by_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<Application>, StoreError> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE applicant_id = $1 ORDER BY created_at DESC"
        );

        let applications = sqlx::query_as::<_, Application>(&query)
            .bind(applicant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(applications)
    }

    async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, StoreError> {
        let query = format!(
            r#"
            UPDATE applications
            SET status = $2
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#
        );

        let application = sqlx::query_as::<_, Application>(&query)
            .bind(application_id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?;

        Ok(application)
    }

    async fn withdraw_application(&self, application_id: Uuid) -> Result<WithdrawOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 FOR UPDATE");

        let application = sqlx::query_as::<_, Application>(&query)
            .bind(application_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(application) = application else {
            return Ok(WithdrawOutcome::NotFound);
        };

        let detached = sqlx::query(
            r#"
            UPDATE jobs
            SET applicants = array_remove(applicants, $2), updated_at = NOW()
            WHERE id = $1 AND selected_worker_id IS DISTINCT FROM $2
            "#,
        )
        .bind(application.job_id)
        .bind(application.applicant_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if detached == 0 {
            return Ok(WithdrawOutcome::SelectedWorker);
        }

        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(application_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(WithdrawOutcome::Withdrawn)
    }
}
