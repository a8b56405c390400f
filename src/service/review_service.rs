use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{Store, StoreError},
    dtos::{reviewdtos::CreateReviewDto, userdtos::UserReviewsDto},
    models::jobmodel::{NewReview, Review},
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct ReviewService {
    db_client: Arc<dyn Store>,
}

impl ReviewService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    /// Records one party's review of the other once the job is done. The
    /// reviewed user's rating is recomputed in the same write.
    pub async fn create_review(
        &self,
        reviewer_id: Uuid,
        review_data: CreateReviewDto,
    ) -> Result<Review, ServiceError> {
        review_data
            .validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let (Some(job_id), Some(reviewed_user_id), Some(rating), Some(comment)) = (
            review_data.job_id,
            review_data.reviewed_user_id,
            review_data.rating,
            review_data.comment,
        ) else {
            return Err(ServiceError::Validation(
                "job_id, reviewed_user_id, rating and comment are required".to_string(),
            ));
        };

        let comment = comment.trim().to_string();
        if comment.is_empty() {
            return Err(ServiceError::Validation("Comment is required".to_string()));
        }

        let job = self
            .db_client
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if !job.status.is_reviewable() {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }
        if !job.is_party(reviewer_id) {
            return Err(ServiceError::UnauthorizedJobAccess(reviewer_id, job_id));
        }
        if reviewer_id == reviewed_user_id {
            return Err(ServiceError::Validation(
                "You cannot review yourself".to_string(),
            ));
        }
        if job.counterparty(reviewer_id) != Some(reviewed_user_id) {
            return Err(ServiceError::Validation(
                "You can only review the other party of this job".to_string(),
            ));
        }

        if self
            .db_client
            .get_review_by_job_and_reviewer(job_id, reviewer_id)
            .await?
            .is_some()
        {
            return Err(already_reviewed());
        }

        let (review, rating) = self
            .db_client
            .create_review(NewReview {
                job_id,
                reviewer_id,
                reviewed_user_id,
                rating,
                comment,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => already_reviewed(),
                StoreError::MissingReference(_) => ServiceError::JobNotFound(job_id),
                other => other.into(),
            })?;

        tracing::info!(
            "Review {} on job {} recorded; user {} now rated {:.1}",
            review.id,
            job_id,
            reviewed_user_id,
            rating
        );

        Ok(review)
    }

    pub async fn list_reviews(&self, user_id: Uuid) -> Result<UserReviewsDto, ServiceError> {
        let user = self
            .db_client
            .get_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        let reviews = self.db_client.get_user_reviews(user_id).await?;

        Ok(UserReviewsDto {
            user_id,
            rating: user.rating,
            reviews,
        })
    }
}

fn already_reviewed() -> ServiceError {
    ServiceError::Conflict("You have already reviewed this job".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{
            memory::{testutil::seed_user, MemoryStore},
            userdb::UserExt,
        },
        models::{jobmodel::JobStatus, usermodel::User},
        service::job_service::{tests::job_dto, JobService},
    };

    struct Fixture {
        store: Arc<MemoryStore>,
        jobs: JobService,
        reviews: ReviewService,
        poster: User,
        worker: User,
        job_id: Uuid,
    }

    /// A job with a selected worker, left in `assigned`.
    async fn assigned_job() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let jobs = JobService::new(store.clone());
        let reviews = ReviewService::new(store.clone());
        let poster = seed_user(&store, "Poster").await;
        let worker = seed_user(&store, "Worker").await;

        let job = jobs.create_job(poster.id, job_dto("Fix sink")).await.unwrap();
        jobs.apply(job.id, worker.id).await.unwrap();
        jobs.select_applicant(job.id, poster.id, worker.id).await.unwrap();

        Fixture {
            store,
            jobs,
            reviews,
            poster,
            worker,
            job_id: job.id,
        }
    }

    fn review(job_id: Uuid, reviewed: Uuid, rating: i32) -> CreateReviewDto {
        CreateReviewDto {
            job_id: Some(job_id),
            reviewed_user_id: Some(reviewed),
            rating: Some(rating),
            comment: Some("Good work, on time".to_string()),
        }
    }

    async fn rating_of(store: &MemoryStore, user_id: Uuid) -> f64 {
        store.get_user(user_id).await.unwrap().unwrap().rating
    }

    #[tokio::test]
    async fn test_review_before_completion_is_invalid_state() {
        let f = assigned_job().await;

        let result = f
            .reviews
            .create_review(f.poster.id, review(f.job_id, f.worker.id, 5))
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::InvalidJobStatus(_, JobStatus::Assigned))
        ));
    }

    #[tokio::test]
    async fn test_both_parties_review_after_completion() {
        let f = assigned_job().await;
        f.jobs.complete_job(f.job_id, f.worker.id).await.unwrap();

        f.reviews
            .create_review(f.poster.id, review(f.job_id, f.worker.id, 5))
            .await
            .unwrap();
        assert_eq!(rating_of(&f.store, f.worker.id).await, 5.0);

        f.reviews
            .create_review(f.worker.id, review(f.job_id, f.poster.id, 4))
            .await
            .unwrap();
        assert_eq!(rating_of(&f.store, f.poster.id).await, 4.0);

        let listed = f.reviews.list_reviews(f.worker.id).await.unwrap();
        assert_eq!(listed.reviews.len(), 1);
        assert_eq!(listed.rating, 5.0);
    }

    #[tokio::test]
    async fn test_second_review_conflicts() {
        let f = assigned_job().await;
        f.jobs.complete_job(f.job_id, f.worker.id).await.unwrap();

        f.reviews
            .create_review(f.poster.id, review(f.job_id, f.worker.id, 5))
            .await
            .unwrap();
        let again = f
            .reviews
            .create_review(f.poster.id, review(f.job_id, f.worker.id, 1))
            .await;

        assert!(matches!(again, Err(ServiceError::Conflict(_))));
        assert_eq!(rating_of(&f.store, f.worker.id).await, 5.0);
    }

    #[tokio::test]
    async fn test_review_parties_and_targets() {
        let f = assigned_job().await;
        let stranger = seed_user(&f.store, "Stranger").await;
        f.jobs.complete_job(f.job_id, f.worker.id).await.unwrap();

        let outsider = f
            .reviews
            .create_review(stranger.id, review(f.job_id, f.worker.id, 3))
            .await;
        assert!(matches!(outsider, Err(ServiceError::UnauthorizedJobAccess(_, _))));

        let self_review = f
            .reviews
            .create_review(f.worker.id, review(f.job_id, f.worker.id, 5))
            .await;
        assert!(matches!(self_review, Err(ServiceError::Validation(_))));

        let wrong_target = f
            .reviews
            .create_review(f.poster.id, review(f.job_id, stranger.id, 2))
            .await;
        assert!(matches!(wrong_target, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rating_bounds_and_missing_job() {
        let f = assigned_job().await;
        f.jobs.complete_job(f.job_id, f.worker.id).await.unwrap();

        for rating in [0, 6] {
            let result = f
                .reviews
                .create_review(f.poster.id, review(f.job_id, f.worker.id, rating))
                .await;
            assert!(matches!(result, Err(ServiceError::Validation(_))));
        }

        let mut blank = review(f.job_id, f.worker.id, 4);
        blank.comment = Some("   ".to_string());
        let result = f.reviews.create_review(f.poster.id, blank).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let missing = f
            .reviews
            .create_review(f.poster.id, review(Uuid::new_v4(), f.worker.id, 4))
            .await;
        assert!(matches!(missing, Err(ServiceError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_rating_is_rounded_mean_over_jobs() {
        let store = Arc::new(MemoryStore::new());
        let jobs = JobService::new(store.clone());
        let reviews = ReviewService::new(store.clone());
        let worker = seed_user(&store, "Worker").await;

        for rating in [5, 4, 4] {
            let poster = seed_user(&store, "Poster").await;
            let job = jobs.create_job(poster.id, job_dto("Job")).await.unwrap();
            jobs.apply(job.id, worker.id).await.unwrap();
            jobs.select_applicant(job.id, poster.id, worker.id).await.unwrap();
            jobs.complete_job(job.id, worker.id).await.unwrap();
            reviews
                .create_review(poster.id, review(job.id, worker.id, rating))
                .await
                .unwrap();
        }

        // mean 4.333.. -> 4.3
        assert_eq!(rating_of(&store, worker.id).await, 4.3);
    }

    #[tokio::test]
    async fn test_paid_job_is_reviewable() {
        let f = assigned_job().await;
        f.jobs.complete_job(f.job_id, f.worker.id).await.unwrap();
        f.jobs.confirm_payment(f.job_id).await.unwrap();

        f.reviews
            .create_review(f.worker.id, review(f.job_id, f.poster.id, 3))
            .await
            .unwrap();
        assert_eq!(rating_of(&f.store, f.poster.id).await, 3.0);
    }
}
