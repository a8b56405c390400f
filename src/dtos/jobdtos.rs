use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    chatmodel::ChatMessage,
    jobmodel::{Application, ApplicationStatus, Job},
};

pub const DEFAULT_JOBS_PER_PAGE: u32 = 20;
pub const DEFAULT_MESSAGES_PER_PAGE: u32 = 50;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn message(message: &str) -> ApiResponse<()> {
        ApiResponse {
            status: "success".to_string(),
            message: message.to_string(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateJobDto {
    #[validate(
        required(message = "Title is required"),
        length(min = 1, max = 100, message = "Title must be between 1 and 100 characters")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Description is required"),
        length(min = 1, max = 5000, message = "Description must be between 1 and 5000 characters")
    )]
    pub description: Option<String>,

    #[validate(
        required(message = "Location is required"),
        length(min = 1, max = 255, message = "Location must be between 1 and 255 characters")
    )]
    pub location: Option<String>,

    #[validate(required(message = "Payment is required"))]
    pub payment: Option<f64>,

    #[validate(
        required(message = "Category is required"),
        length(min = 1, max = 100, message = "Category must be between 1 and 100 characters")
    )]
    pub category: Option<String>,

    #[serde(default)]
    pub urgency_flag: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateJobDto {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Description must be between 1 and 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Location must be between 1 and 255 characters"))]
    pub location: Option<String>,

    pub payment: Option<f64>,

    #[validate(length(min = 1, max = 100, message = "Category must be between 1 and 100 characters"))]
    pub category: Option<String>,

    pub urgency_flag: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    pub urgent: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PaginationQuery {
    /// `(limit, offset)` with the page clamped to 1 and the limit to `1..=MAX_PER_PAGE`.
    pub fn limit_offset(&self, default_limit: u32) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1) as i64;
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_PER_PAGE) as i64;
        (limit, (page - 1) * limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SelectApplicantDto {
    #[validate(required(message = "applicant_id is required"))]
    pub applicant_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplicationStatusDto {
    #[validate(required(message = "Status is required"))]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageDto {
    #[validate(
        required(message = "Message is required"),
        length(min = 1, max = 2000, message = "Message must be between 1 and 2000 characters")
    )]
    pub message: Option<String>,
}

/// What a poster sees of an applicant. Contact details are never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantProfileDto {
    pub id: Uuid,
    pub name: String,
    pub rating: f64,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantDto {
    pub application_id: Uuid,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub applicant: ApplicantProfileDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedJobDto {
    pub application_id: Uuid,
    pub application_status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub job: Job,
}

impl AppliedJobDto {
    pub fn new(application: Application, job: Job) -> Self {
        Self {
            application_id: application.id,
            application_status: application.status,
            applied_at: application.created_at,
            job,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePageDto {
    pub page: u32,
    pub limit: u32,
    pub messages: Vec<ChatMessage>,
}
