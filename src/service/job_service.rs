use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{applicationdb::WithdrawOutcome, Store, StoreError},
    dtos::jobdtos::*,
    models::jobmodel::*,
    service::{error::ServiceError, payment_service::to_minor_units},
};

/// Owns the job state machine. Every write to `Job.status` and
/// `Job.selected_worker_id` goes through here.
#[derive(Debug, Clone)]
pub struct JobService {
    db_client: Arc<dyn Store>,
}

impl JobService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn create_job(
        &self,
        poster_id: Uuid,
        job_data: CreateJobDto,
    ) -> Result<Job, ServiceError> {
        job_data
            .validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let payment = job_data
            .payment
            .ok_or_else(|| ServiceError::Validation("Payment is required".to_string()))?;
        check_payment(payment)?;

        let new_job = NewJob {
            title: required_text("Title", job_data.title)?,
            description: required_text("Description", job_data.description)?,
            location: required_text("Location", job_data.location)?,
            payment,
            category: required_text("Category", job_data.category)?,
            urgency_flag: job_data.urgency_flag,
        };

        let job = self.db_client.create_job(poster_id, new_job).await?;

        tracing::info!("Job {} created by {}", job.id, poster_id);
        Ok(job)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.db_client
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    pub async fn list_open_jobs(&self, query: JobListQuery) -> Result<Vec<Job>, ServiceError> {
        let pagination = PaginationQuery {
            page: query.page,
            limit: query.limit,
        };
        let (limit, offset) = pagination.limit_offset(DEFAULT_JOBS_PER_PAGE);

        let filter = JobFilter {
            category: non_blank(query.category),
            location: non_blank(query.location),
            urgent_only: query.urgent.unwrap_or(false),
            limit,
            offset,
        };

        Ok(self.db_client.get_open_jobs(&filter).await?)
    }

    /// Content edits by the poster while the job is still open.
    pub async fn update_job(
        &self,
        job_id: Uuid,
        requester_id: Uuid,
        update: UpdateJobDto,
    ) -> Result<Job, ServiceError> {
        update
            .validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        if let Some(payment) = update.payment {
            check_payment(payment)?;
        }

        let details = JobDetailsUpdate {
            title: optional_text("Title", update.title)?,
            description: optional_text("Description", update.description)?,
            location: optional_text("Location", update.location)?,
            payment: update.payment,
            category: optional_text("Category", update.category)?,
            urgency_flag: update.urgency_flag,
        };

        let job = self.get_job(job_id).await?;
        if !job.is_poster(requester_id) {
            return Err(ServiceError::UnauthorizedJobAccess(requester_id, job_id));
        }
        if job.status != JobStatus::Open {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        match self.db_client.update_job_details(job_id, details).await? {
            Some(job) => Ok(job),
            None => Err(self.stale_job(job_id).await),
        }
    }

    pub async fn apply(&self, job_id: Uuid, applicant_id: Uuid) -> Result<Application, ServiceError> {
        let job = self.get_job(job_id).await?;

        if job.is_poster(applicant_id) {
            return Err(ServiceError::Conflict(
                "You cannot apply to your own job".to_string(),
            ));
        }
        if job.has_applicant(applicant_id) {
            return Err(already_applied());
        }

        let application = self
            .db_client
            .create_application(job_id, applicant_id)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => already_applied(),
                StoreError::MissingReference(_) => ServiceError::JobNotFound(job_id),
                other => other.into(),
            })?;

        tracing::info!("User {} applied to job {}", applicant_id, job_id);
        Ok(application)
    }

    pub async fn list_applicants(
        &self,
        job_id: Uuid,
        requester_id: Uuid,
    ) -> Result<Vec<ApplicantDto>, ServiceError> {
        let job = self.get_job(job_id).await?;
        if !job.is_poster(requester_id) {
            return Err(ServiceError::UnauthorizedJobAccess(requester_id, job_id));
        }

        let applications = self.db_client.get_job_applications(job_id).await?;
        let applicant_ids: Vec<Uuid> = applications.iter().map(|a| a.applicant_id).collect();
        let users: HashMap<Uuid, _> = self
            .db_client
            .get_users_by_ids(&applicant_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(applications
            .into_iter()
            .filter_map(|application| {
                let user = users.get(&application.applicant_id)?;
                Some(ApplicantDto {
                    application_id: application.id,
                    status: application.status,
                    applied_at: application.created_at,
                    applicant: ApplicantProfileDto {
                        id: user.id,
                        name: user.name.clone(),
                        rating: user.rating,
                        skills: user.skills.clone(),
                    },
                })
            })
            .collect())
    }

    /// `open -> assigned`. Happens exactly once per job: a job that is not
    /// open is refused before the caller is even looked at.
    pub async fn select_applicant(
        &self,
        job_id: Uuid,
        requester_id: Uuid,
        applicant_id: Uuid,
    ) -> Result<Job, ServiceError> {
        let job = self.get_job(job_id).await?;

        if job.status != JobStatus::Open {
            tracing::debug!("Refused selection on job {} in status {}", job_id, job.status.to_str());
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }
        if !job.is_poster(requester_id) {
            return Err(ServiceError::UnauthorizedJobAccess(requester_id, job_id));
        }
        if !job.has_applicant(applicant_id) {
            return Err(not_an_applicant(applicant_id));
        }

        match self.db_client.assign_worker(job_id, applicant_id).await? {
            Some(job) => {
                tracing::info!("Job {} assigned to {}", job_id, applicant_id);
                Ok(job)
            }
            // Lost a race: either someone else selected first or the
            // applicant withdrew in between.
            None => match self.db_client.get_job(job_id).await? {
                None => Err(ServiceError::JobNotFound(job_id)),
                Some(job) if job.status != JobStatus::Open => {
                    Err(ServiceError::InvalidJobStatus(job_id, job.status))
                }
                Some(_) => Err(not_an_applicant(applicant_id)),
            },
        }
    }

    /// `assigned -> completed`, by the selected worker only.
    pub async fn complete_job(&self, job_id: Uuid, requester_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.get_job(job_id).await?;

        if !job.is_selected_worker(requester_id) {
            return Err(ServiceError::UnauthorizedJobAccess(requester_id, job_id));
        }
        if job.status != JobStatus::Assigned {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let job = self
            .transition(job_id, JobStatus::Assigned, JobStatus::Completed)
            .await?;
        tracing::info!("Job {} marked completed by {}", job_id, requester_id);
        Ok(job)
    }

    /// `open -> canceled`, by the poster only.
    pub async fn cancel_job(&self, job_id: Uuid, requester_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.get_job(job_id).await?;

        if !job.is_poster(requester_id) {
            return Err(ServiceError::UnauthorizedJobAccess(requester_id, job_id));
        }
        if job.status != JobStatus::Open {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let job = self
            .transition(job_id, JobStatus::Open, JobStatus::Canceled)
            .await?;
        tracing::info!("Job {} canceled", job_id);
        Ok(job)
    }

    pub async fn delete_job(&self, job_id: Uuid, requester_id: Uuid) -> Result<(), ServiceError> {
        let job = self.get_job(job_id).await?;
        if !job.is_poster(requester_id) {
            return Err(ServiceError::UnauthorizedJobAccess(requester_id, job_id));
        }

        if !self.db_client.delete_job_cascade(job_id).await? {
            return Err(ServiceError::JobNotFound(job_id));
        }

        tracing::info!("Job {} deleted by {}", job_id, requester_id);
        Ok(())
    }

    /// `completed -> paid`. Only reachable through a verified payment
    /// confirmation, never from a client request.
    pub async fn confirm_payment(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.get_job(job_id).await?;
        if job.status != JobStatus::Completed {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let job = self
            .transition(job_id, JobStatus::Completed, JobStatus::Paid)
            .await?;
        tracing::info!("Payment confirmed for job {}", job_id);
        Ok(job)
    }

    pub async fn withdraw_application(
        &self,
        application_id: Uuid,
        requester_id: Uuid,
    ) -> Result<(), ServiceError> {
        let application = self.get_application(application_id).await?;
        if application.applicant_id != requester_id {
            return Err(ServiceError::UnauthorizedApplicationAccess(
                requester_id,
                application_id,
            ));
        }

        match self.db_client.withdraw_application(application_id).await? {
            WithdrawOutcome::Withdrawn => {
                tracing::info!(
                    "User {} withdrew from job {}",
                    requester_id,
                    application.job_id
                );
                Ok(())
            }
            WithdrawOutcome::NotFound => Err(ServiceError::ApplicationNotFound(application_id)),
            WithdrawOutcome::SelectedWorker => Err(ServiceError::InvalidApplicationState(
                application_id,
                "you are the selected worker for this job".to_string(),
            )),
        }
    }

    pub async fn set_application_status(
        &self,
        application_id: Uuid,
        requester_id: Uuid,
        status: &str,
    ) -> Result<Application, ServiceError> {
        let application = self.get_application(application_id).await?;
        let job = self.get_job(application.job_id).await?;

        if !job.is_poster(requester_id) {
            return Err(ServiceError::UnauthorizedApplicationAccess(
                requester_id,
                application_id,
            ));
        }

        let status = ApplicationStatus::parse_decision(status).ok_or_else(|| {
            ServiceError::Validation("Status must be either accepted or rejected".to_string())
        })?;

        let application = self
            .db_client
            .update_application_status(application_id, status)
            .await?
            .ok_or(ServiceError::ApplicationNotFound(application_id))?;

        tracing::info!("Application {} marked {}", application_id, status.to_str());
        Ok(application)
    }

    pub async fn poster_jobs(&self, user_id: Uuid) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.get_jobs_by_poster(user_id).await?)
    }

    /// Jobs the user applied to, newest application first.
    pub async fn applied_jobs(&self, user_id: Uuid) -> Result<Vec<AppliedJobDto>, ServiceError> {
        let applications = self.db_client.get_applications_by_applicant(user_id).await?;
        let job_ids: Vec<Uuid> = applications.iter().map(|a| a.job_id).collect();
        let mut jobs: HashMap<Uuid, Job> = self
            .db_client
            .get_jobs_by_ids(&job_ids)
            .await?
            .into_iter()
            .map(|j| (j.id, j))
            .collect();

        Ok(applications
            .into_iter()
            .filter_map(|application| {
                let job = jobs.remove(&application.job_id)?;
                Some(AppliedJobDto::new(application, job))
            })
            .collect())
    }

    async fn get_application(&self, application_id: Uuid) -> Result<Application, ServiceError> {
        self.db_client
            .get_application(application_id)
            .await?
            .ok_or(ServiceError::ApplicationNotFound(application_id))
    }

    async fn transition(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Job, ServiceError> {
        match self.db_client.transition_job_status(job_id, from, to).await? {
            Some(job) => Ok(job),
            None => Err(self.stale_job(job_id).await),
        }
    }

    /// Classifies a conditional write that matched nothing.
    async fn stale_job(&self, job_id: Uuid) -> ServiceError {
        match self.db_client.get_job(job_id).await {
            Ok(Some(job)) => ServiceError::InvalidJobStatus(job_id, job.status),
            Ok(None) => ServiceError::JobNotFound(job_id),
            Err(e) => e.into(),
        }
    }
}

fn already_applied() -> ServiceError {
    ServiceError::Conflict("You have already applied to this job".to_string())
}

fn not_an_applicant(user_id: Uuid) -> ServiceError {
    ServiceError::Validation(format!("User {user_id} has not applied to this job"))
}

/// The amount must survive conversion to a payable order.
fn check_payment(payment: f64) -> Result<(), ServiceError> {
    if payment.is_finite() && to_minor_units(payment) > 0 {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            "Payment must be a positive number".to_string(),
        ))
    }
}

fn required_text(field: &str, value: Option<String>) -> Result<String, ServiceError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ServiceError::Validation(format!("{field} is required"))),
    }
}

fn optional_text(field: &str, value: Option<String>) -> Result<Option<String>, ServiceError> {
    match value {
        Some(v) => required_text(field, Some(v)).map(Some),
        None => Ok(None),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::{
        memory::{testutil::seed_user, MemoryStore},
        userdb::UserExt,
    };

    pub(crate) fn job_dto(title: &str) -> CreateJobDto {
        CreateJobDto {
            title: Some(title.to_string()),
            description: Some("Fix a leaking pipe under the sink".to_string()),
            location: Some("Kochi, Kerala".to_string()),
            payment: Some(1500.0),
            category: Some("plumbing".to_string()),
            urgency_flag: false,
        }
    }

    fn setup() -> (Arc<MemoryStore>, JobService) {
        let store = Arc::new(MemoryStore::new());
        let service = JobService::new(store.clone());
        (store, service)
    }

    fn assert_worker_invariant(job: &Job) {
        if let Some(worker) = job.selected_worker_id {
            assert!(matches!(
                job.status,
                JobStatus::Assigned | JobStatus::Completed | JobStatus::Paid
            ));
            assert!(job.applicants.contains(&worker));
        }
    }

    #[tokio::test]
    async fn test_create_job_starts_open() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;

        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();

        assert_eq!(job.status, JobStatus::Open);
        assert!(job.applicants.is_empty());
        assert!(job.selected_worker_id.is_none());
        assert_eq!(job.posted_by, poster.id);
    }

    #[tokio::test]
    async fn test_create_job_validation() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;

        let mut missing_title = job_dto("x");
        missing_title.title = None;
        let mut blank_category = job_dto("x");
        blank_category.category = Some("   ".to_string());
        let mut negative = job_dto("x");
        negative.payment = Some(-10.0);
        let mut zero = job_dto("x");
        zero.payment = Some(0.0);
        let mut below_minor_unit = job_dto("x");
        below_minor_unit.payment = Some(0.004);

        for dto in [missing_title, blank_category, negative, zero, below_minor_unit] {
            let result = service.create_job(poster.id, dto).await;
            assert!(matches!(result, Err(ServiceError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_scenario_apply_select_and_late_applicant() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let late = seed_user(&store, "Late").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();

        let application = service.apply(job.id, worker.id).await.unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);
        let job_now = service.get_job(job.id).await.unwrap();
        assert_eq!(job_now.applicants, vec![worker.id]);

        let assigned = service
            .select_applicant(job.id, poster.id, worker.id)
            .await
            .unwrap();
        assert_eq!(assigned.status, JobStatus::Assigned);
        assert_eq!(assigned.selected_worker_id, Some(worker.id));
        assert_worker_invariant(&assigned);

        // Applying is not gated by status, selection is.
        service.apply(job.id, late.id).await.unwrap();
        let result = service.select_applicant(job.id, poster.id, late.id).await;
        assert!(matches!(
            result,
            Err(ServiceError::InvalidJobStatus(_, JobStatus::Assigned))
        ));
    }

    #[tokio::test]
    async fn test_apply_twice_conflicts() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();

        service.apply(job.id, worker.id).await.unwrap();
        let second = service.apply(job.id, worker.id).await;

        assert!(matches!(second, Err(ServiceError::Conflict(_))));
        assert_eq!(service.get_job(job.id).await.unwrap().applicants.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_to_own_job_or_missing_job() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();

        let own = service.apply(job.id, poster.id).await;
        assert!(matches!(own, Err(ServiceError::Conflict(_))));

        let missing = service.apply(Uuid::new_v4(), poster.id).await;
        assert!(matches!(missing, Err(ServiceError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_applicants_poster_only_without_contact_info() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();
        service.apply(job.id, worker.id).await.unwrap();

        let denied = service.list_applicants(job.id, worker.id).await;
        assert!(matches!(denied, Err(ServiceError::UnauthorizedJobAccess(_, _))));

        let applicants = service.list_applicants(job.id, poster.id).await.unwrap();
        assert_eq!(applicants.len(), 1);
        assert_eq!(applicants[0].applicant.id, worker.id);
        assert_eq!(applicants[0].applicant.name, "Worker");

        let json = serde_json::to_value(&applicants[0]).unwrap();
        assert!(json["applicant"].get("email").is_none());
        assert!(json["applicant"].get("phone").is_none());
    }

    #[tokio::test]
    async fn test_select_checks() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let stranger = seed_user(&store, "Stranger").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();
        service.apply(job.id, worker.id).await.unwrap();

        let not_poster = service.select_applicant(job.id, stranger.id, worker.id).await;
        assert!(matches!(not_poster, Err(ServiceError::UnauthorizedJobAccess(_, _))));

        let not_applicant = service.select_applicant(job.id, poster.id, stranger.id).await;
        assert!(matches!(not_applicant, Err(ServiceError::Validation(_))));

        let missing = service
            .select_applicant(Uuid::new_v4(), poster.id, worker.id)
            .await;
        assert!(matches!(missing, Err(ServiceError::JobNotFound(_))));

        service.select_applicant(job.id, poster.id, worker.id).await.unwrap();

        // Not open: InvalidState regardless of who asks.
        for caller in [poster.id, worker.id, stranger.id] {
            let again = service.select_applicant(job.id, caller, worker.id).await;
            assert!(matches!(again, Err(ServiceError::InvalidJobStatus(_, _))));
        }
    }

    #[tokio::test]
    async fn test_concurrent_selection_has_one_winner() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let first = seed_user(&store, "First").await;
        let second = seed_user(&store, "Second").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();
        service.apply(job.id, first.id).await.unwrap();
        service.apply(job.id, second.id).await.unwrap();

        let (a, b) = tokio::join!(
            service.select_applicant(job.id, poster.id, first.id),
            service.select_applicant(job.id, poster.id, second.id),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(ServiceError::InvalidJobStatus(_, _))))
                .count(),
            1
        );
        assert_worker_invariant(&service.get_job(job.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_complete_only_by_selected_worker_when_assigned() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let other = seed_user(&store, "Other").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();
        service.apply(job.id, worker.id).await.unwrap();
        service.apply(job.id, other.id).await.unwrap();

        // Open job: nobody is the selected worker yet.
        let early = service.complete_job(job.id, worker.id).await;
        assert!(matches!(early, Err(ServiceError::UnauthorizedJobAccess(_, _))));

        service.select_applicant(job.id, poster.id, worker.id).await.unwrap();

        for caller in [poster.id, other.id] {
            let denied = service.complete_job(job.id, caller).await;
            assert!(matches!(denied, Err(ServiceError::UnauthorizedJobAccess(_, _))));
        }

        let completed = service.complete_job(job.id, worker.id).await.unwrap();
        assert_eq!(completed.status, JobStatus::Completed);

        let twice = service.complete_job(job.id, worker.id).await;
        assert!(matches!(
            twice,
            Err(ServiceError::InvalidJobStatus(_, JobStatus::Completed))
        ));
    }

    #[tokio::test]
    async fn test_cancel_only_while_open() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;

        let job = service.create_job(poster.id, job_dto("Paint")).await.unwrap();
        let denied = service.cancel_job(job.id, worker.id).await;
        assert!(matches!(denied, Err(ServiceError::UnauthorizedJobAccess(_, _))));
        let canceled = service.cancel_job(job.id, poster.id).await.unwrap();
        assert_eq!(canceled.status, JobStatus::Canceled);

        let job = service.create_job(poster.id, job_dto("Tile")).await.unwrap();
        service.apply(job.id, worker.id).await.unwrap();
        service.select_applicant(job.id, poster.id, worker.id).await.unwrap();
        let late = service.cancel_job(job.id, poster.id).await;
        assert!(matches!(late, Err(ServiceError::InvalidJobStatus(_, _))));
    }

    #[tokio::test]
    async fn test_update_job_poster_only_while_open() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();

        let update = UpdateJobDto {
            title: Some("Fix kitchen sink".to_string()),
            payment: Some(2000.0),
            ..Default::default()
        };
        let denied = service.update_job(job.id, worker.id, update.clone()).await;
        assert!(matches!(denied, Err(ServiceError::UnauthorizedJobAccess(_, _))));

        let updated = service.update_job(job.id, poster.id, update).await.unwrap();
        assert_eq!(updated.title, "Fix kitchen sink");
        assert_eq!(updated.payment, 2000.0);
        assert_eq!(updated.description, job.description);

        let bad = UpdateJobDto {
            payment: Some(-1.0),
            ..Default::default()
        };
        let invalid = service.update_job(job.id, poster.id, bad).await;
        assert!(matches!(invalid, Err(ServiceError::Validation(_))));

        service.apply(job.id, worker.id).await.unwrap();
        service.select_applicant(job.id, poster.id, worker.id).await.unwrap();
        let late = service
            .update_job(job.id, poster.id, UpdateJobDto::default())
            .await;
        assert!(matches!(late, Err(ServiceError::InvalidJobStatus(_, _))));
    }

    #[tokio::test]
    async fn test_delete_job_cascades() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();
        let application = service.apply(job.id, worker.id).await.unwrap();

        let denied = service.delete_job(job.id, worker.id).await;
        assert!(matches!(denied, Err(ServiceError::UnauthorizedJobAccess(_, _))));

        service.delete_job(job.id, poster.id).await.unwrap();

        assert!(matches!(
            service.get_job(job.id).await,
            Err(ServiceError::JobNotFound(_))
        ));
        let withdraw = service.withdraw_application(application.id, worker.id).await;
        assert!(matches!(withdraw, Err(ServiceError::ApplicationNotFound(_))));
        assert!(service.applied_jobs(worker.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_application() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let other = seed_user(&store, "Other").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();
        let application = service.apply(job.id, worker.id).await.unwrap();

        let denied = service.withdraw_application(application.id, other.id).await;
        assert!(matches!(
            denied,
            Err(ServiceError::UnauthorizedApplicationAccess(_, _))
        ));

        service.withdraw_application(application.id, worker.id).await.unwrap();
        assert!(service.get_job(job.id).await.unwrap().applicants.is_empty());

        // Can apply again after withdrawing.
        service.apply(job.id, worker.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_selected_worker_cannot_withdraw() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();
        let application = service.apply(job.id, worker.id).await.unwrap();
        service.select_applicant(job.id, poster.id, worker.id).await.unwrap();

        let result = service.withdraw_application(application.id, worker.id).await;

        assert!(matches!(result, Err(ServiceError::InvalidApplicationState(_, _))));
        assert_worker_invariant(&service.get_job(job.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_application_status() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();
        let application = service.apply(job.id, worker.id).await.unwrap();

        let denied = service
            .set_application_status(application.id, worker.id, "accepted")
            .await;
        assert!(matches!(
            denied,
            Err(ServiceError::UnauthorizedApplicationAccess(_, _))
        ));

        for bad in ["pending", "maybe", ""] {
            let invalid = service
                .set_application_status(application.id, poster.id, bad)
                .await;
            assert!(matches!(invalid, Err(ServiceError::Validation(_))));
        }

        let rejected = service
            .set_application_status(application.id, poster.id, "rejected")
            .await
            .unwrap();
        assert_eq!(rejected.status, ApplicationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_confirm_payment_requires_completed() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let job = service.create_job(poster.id, job_dto("Fix sink")).await.unwrap();

        let early = service.confirm_payment(job.id).await;
        assert!(matches!(early, Err(ServiceError::InvalidJobStatus(_, JobStatus::Open))));

        service.apply(job.id, worker.id).await.unwrap();
        service.select_applicant(job.id, poster.id, worker.id).await.unwrap();
        service.complete_job(job.id, worker.id).await.unwrap();

        let paid = service.confirm_payment(job.id).await.unwrap();
        assert_eq!(paid.status, JobStatus::Paid);
        assert_worker_invariant(&paid);
    }

    #[tokio::test]
    async fn test_dashboard_views() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let first = service.create_job(poster.id, job_dto("First")).await.unwrap();
        let second = service.create_job(poster.id, job_dto("Second")).await.unwrap();
        service.apply(first.id, worker.id).await.unwrap();

        assert_eq!(service.poster_jobs(poster.id).await.unwrap().len(), 2);
        assert!(service.poster_jobs(worker.id).await.unwrap().is_empty());

        let applied = service.applied_jobs(worker.id).await.unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].job.id, first.id);
        assert_eq!(applied[0].application_status, ApplicationStatus::Pending);
        assert_ne!(applied[0].job.id, second.id);
    }

    #[tokio::test]
    async fn test_list_open_jobs_hides_assigned() {
        let (store, service) = setup();
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;
        let taken = service.create_job(poster.id, job_dto("Taken")).await.unwrap();
        service.create_job(poster.id, job_dto("Free")).await.unwrap();
        service.apply(taken.id, worker.id).await.unwrap();
        service.select_applicant(taken.id, poster.id, worker.id).await.unwrap();

        let jobs = service.list_open_jobs(JobListQuery::default()).await.unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Free");
        assert!(store.get_user(worker.id).await.unwrap().is_some());
    }
}
