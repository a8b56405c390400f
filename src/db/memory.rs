//! Non-durable store used when no database is configured, and by the tests.
//! All state sits behind one mutex owned by the value, so every trait method
//! is applied as a single unit.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    applicationdb::{ApplicationExt, WithdrawOutcome},
    chatdb::ChatExt,
    jobdb::JobExt,
    reviewdb::ReviewExt,
    userdb::UserExt,
    StoreError,
};
use crate::models::{
    chatmodel::ChatMessage,
    jobmodel::{
        average_rating, Application, ApplicationStatus, Job, JobDetailsUpdate, JobFilter,
        JobStatus, NewJob, NewReview, Review,
    },
    usermodel::{NewUser, ProfileUpdate, User},
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    jobs: HashMap<Uuid, Job>,
    applications: HashMap<Uuid, Application>,
    messages: Vec<ChatMessage>,
    reviews: Vec<Review>,
}

impl MemoryState {
    fn refresh_rating(&mut self, user_id: Uuid) -> Option<f64> {
        let ratings: Vec<i32> = self
            .reviews
            .iter()
            .filter(|r| r.reviewed_user_id == user_id)
            .map(|r| r.rating)
            .collect();
        let user = self.users.get_mut(&user_id)?;
        user.rating = average_rating(&ratings);
        user.updated_at = Utc::now();
        Some(user.rating)
    }

    /// Drops every record hanging off `job_id` and the job itself; returns
    /// the users whose received reviews were removed.
    fn remove_job(&mut self, job_id: Uuid) -> Vec<Uuid> {
        let mut reviewed: Vec<Uuid> = Vec::new();
        self.reviews.retain(|r| {
            if r.job_id == job_id {
                reviewed.push(r.reviewed_user_id);
                false
            } else {
                true
            }
        });
        self.messages.retain(|m| m.job_id != job_id);
        self.applications.retain(|_, a| a.job_id != job_id);
        self.jobs.remove(&job_id);
        reviewed
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn save_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state();
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password: user.password_hash,
            phone: user.phone,
            location: user.location,
            skills: user.skills,
            about: None,
            rating: 0.0,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.state().users.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let state = self.state();
        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut state = self.state();
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        if let Some(location) = update.location {
            user.location = Some(location);
        }
        if let Some(skills) = update.skills {
            user.skills = skills;
        }
        if let Some(about) = update.about {
            user.about = Some(about);
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user_cascade(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state();
        if !state.users.contains_key(&user_id) {
            return Ok(false);
        }

        let mut affected: Vec<Uuid> = Vec::new();

        let posted: Vec<Uuid> = state
            .jobs
            .values()
            .filter(|j| j.posted_by == user_id)
            .map(|j| j.id)
            .collect();
        for job_id in posted {
            affected.extend(state.remove_job(job_id));
        }

        state.reviews.retain(|r| {
            if r.reviewer_id == user_id {
                affected.push(r.reviewed_user_id);
                false
            } else {
                r.reviewed_user_id != user_id
            }
        });
        state.messages.retain(|m| m.sender_id != user_id);
        state.applications.retain(|_, a| a.applicant_id != user_id);

        let now = Utc::now();
        for job in state.jobs.values_mut() {
            if job.selected_worker_id == Some(user_id) {
                job.selected_worker_id = None;
                job.status = JobStatus::Open;
                job.updated_at = now;
            }
            if job.applicants.contains(&user_id) {
                job.applicants.retain(|id| *id != user_id);
                job.updated_at = now;
            }
        }

        state.users.remove(&user_id);

        affected.sort();
        affected.dedup();
        for reviewed_user in affected.into_iter().filter(|id| *id != user_id) {
            state.refresh_rating(reviewed_user);
        }

        Ok(true)
    }
}

#[async_trait]
impl JobExt for MemoryStore {
    async fn create_job(&self, posted_by: Uuid, job: NewJob) -> Result<Job, StoreError> {
        let mut state = self.state();
        if !state.users.contains_key(&posted_by) {
            return Err(StoreError::MissingReference("jobs_posted_by_fkey".to_string()));
        }

        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            title: job.title,
            description: job.description,
            location: job.location,
            payment: job.payment,
            category: job.category,
            urgency_flag: job.urgency_flag,
            posted_by,
            status: JobStatus::Open,
            applicants: Vec::new(),
            selected_worker_id: None,
            created_at: now,
            updated_at: now,
        };
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.state().jobs.get(&job_id).cloned())
    }

    async fn get_open_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        let state = self.state();
        let location = filter.location.as_ref().map(|l| l.to_lowercase());

        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Open)
            .filter(|j| {
                filter
                    .category
                    .as_ref()
                    .map_or(true, |c| j.category.eq_ignore_ascii_case(c))
            })
            .filter(|j| {
                location
                    .as_ref()
                    .map_or(true, |l| j.location.to_lowercase().contains(l.as_str()))
            })
            .filter(|j| !filter.urgent_only || j.urgency_flag)
            .cloned()
            .collect();

        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(jobs
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn get_jobs_by_poster(&self, user_id: Uuid) -> Result<Vec<Job>, StoreError> {
        let mut jobs: Vec<Job> = self
            .state()
            .jobs
            .values()
            .filter(|j| j.posted_by == user_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn get_jobs_by_ids(&self, job_ids: &[Uuid]) -> Result<Vec<Job>, StoreError> {
        let state = self.state();
        Ok(job_ids
            .iter()
            .filter_map(|id| state.jobs.get(id).cloned())
            .collect())
    }

    async fn update_job_details(
        &self,
        job_id: Uuid,
        update: JobDetailsUpdate,
    ) -> Result<Option<Job>, StoreError> {
        let mut state = self.state();
        let Some(job) = state.jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        if job.status != JobStatus::Open {
            return Ok(None);
        }

        if let Some(title) = update.title {
            job.title = title;
        }
        if let Some(description) = update.description {
            job.description = description;
        }
        if let Some(location) = update.location {
            job.location = location;
        }
        if let Some(payment) = update.payment {
            job.payment = payment;
        }
        if let Some(category) = update.category {
            job.category = category;
        }
        if let Some(urgency_flag) = update.urgency_flag {
            job.urgency_flag = urgency_flag;
        }
        job.updated_at = Utc::now();

        Ok(Some(job.clone()))
    }

    async fn assign_worker(&self, job_id: Uuid, worker_id: Uuid) -> Result<Option<Job>, StoreError> {
        let mut state = self.state();
        let Some(job) = state.jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        if job.status != JobStatus::Open || !job.applicants.contains(&worker_id) {
            return Ok(None);
        }

        job.selected_worker_id = Some(worker_id);
        job.status = JobStatus::Assigned;
        job.updated_at = Utc::now();

        Ok(Some(job.clone()))
    }

    async fn transition_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError> {
        let mut state = self.state();
        let Some(job) = state.jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        if job.status != from {
            return Ok(None);
        }

        job.status = to;
        job.updated_at = Utc::now();

        Ok(Some(job.clone()))
    }

    async fn delete_job_cascade(&self, job_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state();
        if !state.jobs.contains_key(&job_id) {
            return Ok(false);
        }

        let mut reviewed = state.remove_job(job_id);
        reviewed.sort();
        reviewed.dedup();
        for user_id in reviewed {
            state.refresh_rating(user_id);
        }

        Ok(true)
    }
}

#[async_trait]
impl ApplicationExt for MemoryStore {
    async fn create_application(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
    ) -> Result<Application, StoreError> {
        let mut state = self.state();
        if !state.jobs.contains_key(&job_id) {
            return Err(StoreError::MissingReference("applications_job_id_fkey".to_string()));
        }
        if state
            .applications
            .values()
            .any(|a| a.job_id == job_id && a.applicant_id == applicant_id)
        {
            return Err(StoreError::UniqueViolation(
                "applications_job_id_applicant_id_key".to_string(),
            ));
        }

        let application = Application {
            id: Uuid::new_v4(),
            job_id,
            applicant_id,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        };
        state.applications.insert(application.id, application.clone());

        if let Some(job) = state.jobs.get_mut(&job_id) {
            if !job.applicants.contains(&applicant_id) {
                job.applicants.push(applicant_id);
                job.updated_at = Utc::now();
            }
        }

        Ok(application)
    }

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, StoreError> {
        Ok(self.state().applications.get(&application_id).cloned())
    }

    async fn get_job_applications(&self, job_id: Uuid) -> Result<Vec<Application>, StoreError> {
        let mut applications: Vec<Application> = self
            .state()
            .applications
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        applications.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(applications)
    }

    async fn get_applications_by_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<Application>, StoreError> {
        let mut applications: Vec<Application> = self
            .state()
            .applications
            .values()
            .filter(|a| a.applicant_id == applicant_id)
            .cloned()
            .collect();
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(applications)
    }

    async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, StoreError> {
        let mut state = self.state();
        let Some(application) = state.applications.get_mut(&application_id) else {
            return Ok(None);
        };
        application.status = status;
        Ok(Some(application.clone()))
    }

    async fn withdraw_application(&self, application_id: Uuid) -> Result<WithdrawOutcome, StoreError> {
        let mut state = self.state();
        let Some(application) = state.applications.get(&application_id).cloned() else {
            return Ok(WithdrawOutcome::NotFound);
        };

        if let Some(job) = state.jobs.get_mut(&application.job_id) {
            if job.selected_worker_id == Some(application.applicant_id) {
                return Ok(WithdrawOutcome::SelectedWorker);
            }
            job.applicants.retain(|id| *id != application.applicant_id);
            job.updated_at = Utc::now();
        }
        state.applications.remove(&application_id);

        Ok(WithdrawOutcome::Withdrawn)
    }
}

#[async_trait]
impl ChatExt for MemoryStore {
    async fn create_message(
        &self,
        job_id: Uuid,
        sender_id: Uuid,
        message: String,
    ) -> Result<ChatMessage, StoreError> {
        let mut state = self.state();
        if !state.jobs.contains_key(&job_id) {
            return Err(StoreError::MissingReference("chat_messages_job_id_fkey".to_string()));
        }

        let message = ChatMessage {
            id: Uuid::new_v4(),
            job_id,
            sender_id,
            message,
            created_at: Utc::now(),
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn get_job_messages(
        &self,
        job_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let mut messages: Vec<ChatMessage> = self
            .state()
            .messages
            .iter()
            .filter(|m| m.job_id == job_id)
            .cloned()
            .collect();
        // stable: insertion order breaks timestamp ties
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(messages
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl ReviewExt for MemoryStore {
    async fn create_review(&self, review: NewReview) -> Result<(Review, f64), StoreError> {
        let mut state = self.state();
        if !state.jobs.contains_key(&review.job_id) {
            return Err(StoreError::MissingReference("reviews_job_id_fkey".to_string()));
        }
        if !state.users.contains_key(&review.reviewed_user_id) {
            return Err(StoreError::MissingReference(
                "reviews_reviewed_user_id_fkey".to_string(),
            ));
        }
        if state
            .reviews
            .iter()
            .any(|r| r.job_id == review.job_id && r.reviewer_id == review.reviewer_id)
        {
            return Err(StoreError::UniqueViolation(
                "reviews_job_id_reviewer_id_key".to_string(),
            ));
        }

        let review = Review {
            id: Uuid::new_v4(),
            job_id: review.job_id,
            reviewer_id: review.reviewer_id,
            reviewed_user_id: review.reviewed_user_id,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        state.reviews.push(review.clone());

        let rating = state.refresh_rating(review.reviewed_user_id).ok_or_else(|| {
            StoreError::MissingReference(format!("user {}", review.reviewed_user_id))
        })?;

        Ok((review, rating))
    }

    async fn get_review_by_job_and_reviewer(
        &self,
        job_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<Option<Review>, StoreError> {
        Ok(self
            .state()
            .reviews
            .iter()
            .find(|r| r.job_id == job_id && r.reviewer_id == reviewer_id)
            .cloned())
    }

    async fn get_user_reviews(&self, user_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = self
            .state()
            .reviews
            .iter()
            .filter(|r| r.reviewed_user_id == user_id)
            .cloned()
            .collect();
        reviews.reverse();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}
