use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateReviewDto {
    #[validate(required(message = "job_id is required"))]
    pub job_id: Option<Uuid>,

    #[validate(required(message = "reviewed_user_id is required"))]
    pub reviewed_user_id: Option<Uuid>,

    #[validate(
        required(message = "Rating is required"),
        range(min = 1, max = 5, message = "Rating must be between 1 and 5")
    )]
    pub rating: Option<i32>,

    #[validate(
        required(message = "Comment is required"),
        length(min = 1, max = 2000, message = "Comment must be between 1 and 2000 characters")
    )]
    pub comment: Option<String>,
}
